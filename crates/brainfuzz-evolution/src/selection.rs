//! Parent selection, ranking and survivor retention.
//!
//! # Parent Selection
//!
//! Parents are drawn from the [`SurvivorSet`] by roulette wheel over squared score.
//! Squaring sharpens selection pressure toward high scorers compared to linear
//! weighting.
//!
//! # Survivor Retention
//!
//! After scoring, alive slots are ranked by score. The top slot always survives.
//! Every other slot `i`, in rank order, survives when
//!
//! ```text
//! multiplier · min(1, (score_i / score_top)²) · U > 1 - survival_rate
//! ```
//!
//! for a fresh uniform `U`, where `multiplier` starts at 1 and is multiplied by
//! `survival_falloff` after each slot. Slots that do not survive are marked dead and
//! are respawned next generation.

use std::cmp::Ordering;

use rand::Rng;

use crate::{ProgramArena, ProgramInfo, SlotState, SurvivorSet, random};

/// Draws a parent slot from `survivors`, weighted by squared score.
///
/// Returns `None` only if the survivor set is empty. Rounding that keeps the
/// roulette from stopping falls back to the last survivor.
///
/// An infinite squared score turns the running value into NaN once it is
/// subtracted, which stops the walk at that survivor.
pub fn select_parent<R>(survivors: &SurvivorSet, rng: &mut R) -> Option<usize>
where
    R: Rng + ?Sized,
{
    let mut selection = random::uniform(rng) * survivors.total_squared_score();
    for survivor in survivors.entries() {
        selection -= survivor.squared_score;
        if selection <= 0.0 || selection.is_nan() {
            return Some(survivor.slot);
        }
    }
    survivors.entries().last().map(|s| s.slot)
}

/// Orders two scores descending, with NaN after every number.
fn by_score_descending(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (false, false) => b.total_cmp(&a),
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
    }
}

/// Fills `ranking` with the alive slots, best score first.
///
/// Dead slots are excluded. Ties keep slot order.
pub fn rank_slots(infos: &[ProgramInfo], ranking: &mut Vec<usize>) {
    ranking.clear();
    ranking.extend(
        infos
            .iter()
            .enumerate()
            .filter(|(_, info)| info.state.is_alive())
            .map(|(slot, _)| slot),
    );
    ranking.sort_by(|&a, &b| by_score_descending(infos[a].score, infos[b].score));
}

/// Relative fitness of `score` against the top score, in `[0, 1]`.
fn score_ratio(score: f64, top: f64) -> f64 {
    if top == 0.0 {
        return if score == 0.0 { 1.0 } else { 0.0 };
    }
    let ratio = (score / top).powi(2);
    if ratio.is_nan() { 0.0 } else { ratio.min(1.0) }
}

/// Rebuilds the survivor set from `ranking` and marks the rest dead.
///
/// `ranking` must come from [`rank_slots`] on the current scores. Returns the
/// number of survivors.
pub fn retain_survivors<R>(
    arena: &mut ProgramArena,
    ranking: &[usize],
    survival_rate: f64,
    survival_falloff: f64,
    rng: &mut R,
) -> usize
where
    R: Rng + ?Sized,
{
    arena.survivors_mut().clear();
    let Some((&top, rest)) = ranking.split_first() else {
        return 0;
    };

    let top_score = arena.info(top).score;
    arena.survivors_mut().push(top, top_score);

    let threshold = 1.0 - survival_rate;
    let mut multiplier = 1.0;
    for &slot in rest {
        let score = arena.info(slot).score;
        let ratio = score_ratio(score, top_score);
        if multiplier * ratio * random::uniform(rng) > threshold {
            arena.survivors_mut().push(slot, score);
        } else {
            arena.set_state(slot, SlotState::Dead);
        }
        multiplier *= survival_falloff;
    }
    arena.survivors().len()
}
