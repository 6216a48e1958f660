//! Snake draft order calculation.

use draftpool_core::error::DomainError;

/// Where an overall pick number falls in a snake draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnakeSlot {
    /// 1-based round.
    pub round: i32,
    /// Draft position (1..=participant count) that makes this pick.
    pub position_in_round: i32,
    /// Whether the round runs from the last position back to the first.
    pub is_reverse_round: bool,
}

/// Maps an overall pick number to the draft position on the clock.
///
/// Odd rounds run `1..=n`, even rounds run `n..=1`.
///
/// # Errors
///
/// Returns `DomainError::InvalidArgument` if either argument is below 1.
pub fn locate(pick_overall: i32, participant_count: i32) -> Result<SnakeSlot, DomainError> {
    if participant_count < 1 {
        return Err(DomainError::InvalidArgument(format!(
            "participant count must be at least 1, got {participant_count}"
        )));
    }
    if pick_overall < 1 {
        return Err(DomainError::InvalidArgument(format!(
            "pick number must be at least 1, got {pick_overall}"
        )));
    }

    let round = (pick_overall - 1) / participant_count + 1;
    let forward_position = (pick_overall - 1) % participant_count + 1;
    let is_reverse_round = round % 2 == 0;
    let position_in_round = if is_reverse_round {
        participant_count - forward_position + 1
    } else {
        forward_position
    };

    Ok(SnakeSlot {
        round,
        position_in_round,
        is_reverse_round,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positions(participant_count: i32, picks: std::ops::RangeInclusive<i32>) -> Vec<i32> {
        picks
            .map(|p| locate(p, participant_count).unwrap().position_in_round)
            .collect()
    }

    #[test]
    fn test_four_participants_snake_through_two_rounds() {
        assert_eq!(positions(4, 1..=8), vec![1, 2, 3, 4, 4, 3, 2, 1]);
    }

    #[test]
    fn test_third_round_runs_forward_again() {
        assert_eq!(positions(3, 7..=9), vec![1, 2, 3]);
        assert!(!locate(7, 3).unwrap().is_reverse_round);
    }

    #[test]
    fn test_round_is_ceiling_of_pick_over_count() {
        assert_eq!(locate(4, 4).unwrap().round, 1);
        assert_eq!(locate(5, 4).unwrap().round, 2);
        assert_eq!(locate(9, 4).unwrap().round, 3);
    }

    #[test]
    fn test_turn_boundary_gives_same_position_twice() {
        let end_of_first = locate(4, 4).unwrap();
        let start_of_second = locate(5, 4).unwrap();

        assert_eq!(end_of_first.position_in_round, 4);
        assert_eq!(start_of_second.position_in_round, 4);
        assert!(start_of_second.is_reverse_round);
    }

    #[test]
    fn test_single_participant_always_picks() {
        assert_eq!(positions(1, 1..=4), vec![1, 1, 1, 1]);
    }

    #[test]
    fn test_zero_participants_is_invalid_argument() {
        let result = locate(1, 0);
        assert!(matches!(result, Err(DomainError::InvalidArgument(_))));
    }

    #[test]
    fn test_zero_pick_is_invalid_argument() {
        let result = locate(0, 4);
        assert!(matches!(result, Err(DomainError::InvalidArgument(_))));
    }
}
