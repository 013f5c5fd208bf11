//! Pure rank assignment for leaderboard pages.

use std::collections::HashMap;

use crate::domain::{Level, LeaderboardRow, PlayerId};

/// Assign ranks to a friends page fetched by points descending, placing the
/// requester inside it.
///
/// The requester takes the rank of the first row whose points are `<=` theirs
/// and every row from there on shifts down by one. If the requester's points
/// fall outside the page's range their rank stays `0`.
pub fn interpolate_friend_ranks(me: &mut LeaderboardRow, list: &mut [LeaderboardRow], skip: u64) {
    me.rank = 0;
    let (Some(first), Some(last)) = (list.first(), list.last()) else {
        return;
    };
    let in_range = me.points <= first.points && me.points >= last.points;

    let mut placed = false;
    for (idx, row) in list.iter_mut().enumerate() {
        let position = skip.saturating_add(idx as u64 + 1);
        if in_range && !placed && me.points >= row.points {
            placed = true;
            me.rank = position;
        }
        row.rank = if placed {
            position.saturating_add(1)
        } else {
            position
        };
    }
}

/// Put batch-fetched rows back into ranking-store order and label them with
/// their positional rank. Ids with no row are skipped; their rank number is
/// not reused. With `level` set, rows from stale entries of players who have
/// since changed level are dropped.
pub fn restore_order(
    ids: &[PlayerId],
    rows: Vec<LeaderboardRow>,
    skip: u64,
    level: Option<Level>,
) -> Vec<LeaderboardRow> {
    let mut by_id: HashMap<PlayerId, LeaderboardRow> =
        rows.into_iter().map(|row| (row.player_id, row)).collect();

    ids.iter()
        .enumerate()
        .filter_map(|(idx, id)| {
            let mut row = by_id.remove(id)?;
            if level.is_some_and(|level| row.level != level) {
                return None;
            }
            row.rank = skip.saturating_add(idx as u64 + 1);
            Some(row)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i64, points: i64) -> LeaderboardRow {
        LeaderboardRow {
            player_id: PlayerId::new(id),
            nickname: format!("p{id}"),
            level: Level::ZERO,
            is_premium: false,
            points,
            rank: 0,
        }
    }

    /// Friends with points `total, total-1, ..., 1`, paged.
    fn friends_page(total: i64, limit: u64, skip: u64) -> Vec<LeaderboardRow> {
        (1..=total)
            .rev()
            .map(|points| row(100 + points, points))
            .skip(skip as usize)
            .take(limit as usize)
            .collect()
    }

    fn my_rank(total: i64, limit: u64, skip: u64, my_points: i64) -> (u64, Vec<u64>) {
        let mut me = row(1, my_points);
        let mut list = friends_page(total, limit, skip);
        interpolate_friend_ranks(&mut me, &mut list, skip);
        (me.rank, list.iter().map(|r| r.rank).collect())
    }

    #[test]
    fn test_me_inside_full_page() {
        let (rank, ranks) = my_rank(10, 10, 0, 5);
        assert_eq!(rank, 6);
        assert_eq!(ranks, vec![1, 2, 3, 4, 5, 7, 8, 9, 10, 11]);
    }

    #[test]
    fn test_no_friends() {
        assert_eq!(my_rank(0, 10, 0, 5).0, 0);
    }

    #[test]
    fn test_page_past_the_end() {
        let (rank, ranks) = my_rank(10, 10, 10, 5);
        assert_eq!(rank, 0);
        assert!(ranks.is_empty());
    }

    #[test]
    fn test_me_below_page_range() {
        let (rank, ranks) = my_rank(10, 5, 0, 3);
        assert_eq!(rank, 0);
        assert_eq!(ranks, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_me_inside_second_page() {
        let (rank, ranks) = my_rank(10, 5, 5, 3);
        assert_eq!(rank, 8);
        assert_eq!(ranks, vec![6, 7, 9, 10, 11]);
    }

    #[test]
    fn test_me_above_everyone_on_page() {
        let (rank, _) = my_rank(10, 5, 0, 50);
        assert_eq!(rank, 0);
    }

    #[test]
    fn test_tie_places_me_first() {
        let mut me = row(1, 7);
        let mut list = vec![row(2, 9), row(3, 7), row(4, 7)];
        interpolate_friend_ranks(&mut me, &mut list, 0);
        assert_eq!(me.rank, 2);
        assert_eq!(list.iter().map(|r| r.rank).collect::<Vec<_>>(), vec![1, 3, 4]);
    }

    #[test]
    fn test_restore_order_follows_ids() {
        let ids = vec![PlayerId::new(3), PlayerId::new(1), PlayerId::new(2)];
        let rows = vec![row(1, 20), row(2, 10), row(3, 30)];

        let ordered = restore_order(&ids, rows, 10, None);
        let got: Vec<(i64, u64)> = ordered
            .iter()
            .map(|r| (r.player_id.as_i64(), r.rank))
            .collect();
        assert_eq!(got, vec![(3, 11), (1, 12), (2, 13)]);
    }

    #[test]
    fn test_ranks_saturate_at_huge_skip() {
        let mut me = row(1, 8);
        let mut list = vec![row(2, 9), row(3, 7)];
        interpolate_friend_ranks(&mut me, &mut list, u64::MAX - 1);
        assert_eq!(me.rank, u64::MAX);
        assert_eq!(list.iter().map(|r| r.rank).collect::<Vec<_>>(), vec![u64::MAX, u64::MAX]);

        let ordered = restore_order(&[PlayerId::new(2)], vec![row(2, 9)], u64::MAX, None);
        assert_eq!(ordered[0].rank, u64::MAX);
    }

    #[test]
    fn test_restore_order_skips_missing_and_stale() {
        let ids = vec![PlayerId::new(1), PlayerId::new(2), PlayerId::new(3)];
        let mut moved = row(3, 5);
        moved.level = Level::new(1);
        let rows = vec![moved, row(1, 9)];

        let ordered = restore_order(&ids, rows, 0, Some(Level::ZERO));
        assert_eq!(ordered.len(), 1);
        assert_eq!(ordered[0].player_id, PlayerId::new(1));
        assert_eq!(ordered[0].rank, 1);
    }
}
