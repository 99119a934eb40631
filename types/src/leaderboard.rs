use crate::{
    api::{Leaderboard, LeaderboardEntry, Stats},
    Player,
};

/// Renders elapsed seconds as `{minutes}m {seconds}s`, dropping any fraction.
pub fn format_elapsed(seconds: f64) -> String {
    // Negative spans (clock skew) saturate to zero.
    let whole = seconds as u64;
    format!("{}m {}s", whole / 60, whole % 60)
}

/// Ranks completed players by completion time.
///
/// The sort is stable, so players with identical times keep their
/// registration order.
pub fn leaderboard(players: &[Player]) -> Leaderboard {
    let mut finished = players
        .iter()
        .filter_map(|player| {
            let ended = player.ended()?;
            let elapsed = player.completion_time_seconds()?;
            Some((player, elapsed, ended))
        })
        .collect::<Vec<_>>();
    finished.sort_by(|a, b| a.1.total_cmp(&b.1));

    let entries = finished
        .into_iter()
        .enumerate()
        .map(|(i, (player, elapsed, ended))| LeaderboardEntry {
            rank: (i + 1) as u32,
            name: player.name().to_string(),
            completion_time_seconds: elapsed,
            time_formatted: format_elapsed(elapsed),
            completed_at: ended,
        })
        .collect::<Vec<_>>();

    Leaderboard {
        total_completed: entries.len(),
        total_players: players.len(),
        leaderboard: entries,
    }
}

/// Aggregate counters and completion times.
pub fn stats(players: &[Player]) -> Stats {
    let times = players
        .iter()
        .filter_map(Player::completion_time_seconds)
        .collect::<Vec<_>>();

    let total = players.len();
    let completed = times.len();
    let completion_rate = if total == 0 {
        "0%".to_string()
    } else {
        format!("{:.1}%", completed as f64 / total as f64 * 100.0)
    };
    let average_completion_time =
        (!times.is_empty()).then(|| times.iter().sum::<f64>() / times.len() as f64);
    let fastest_completion_time = times.iter().copied().reduce(f64::min);

    Stats {
        total_players: total,
        completed_players: completed,
        active_players: total - completed,
        completion_rate,
        average_completion_time,
        fastest_completion_time,
    }
}
