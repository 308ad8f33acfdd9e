//! Proposal generation for mission slots.
use rand::seq::SliceRandom;

use crate::board::{Board, Proposal, ProposalList, SlotKey};
use crate::catalog::MissionCatalog;
use crate::rng;

/// Replace a slot's proposals with a freshly generated batch of up to
/// `count` candidates.
///
/// The presented order is drawn from a per-generation RNG stream; when the
/// catalog holds fewer templates than requested, all of them are offered.
/// Each proposal gets a new generation-scoped id even when the same
/// template reappears.
pub fn generate_for_slot(
    board: &mut Board,
    catalog: &MissionCatalog,
    slot: SlotKey,
    count: usize,
    engine_seed: u64,
) {
    let generation = board.next_proposal_seq();
    let mut rng = rng::proposal_rng(engine_seed, &board.user_id, generation);
    let mut proposals: ProposalList = catalog
        .for_slot(slot)
        .map(|template| Proposal {
            id: rng::proposal_id(&board.user_id, &template.template_id, generation),
            template: template.clone(),
        })
        .collect();
    proposals.shuffle(&mut rng);
    proposals.truncate(count);
    board.slot_mut(slot).proposals = proposals;
}

/// Generate proposals only when the slot has none. Idempotent.
/// Returns true when a new batch was produced.
pub fn regenerate_if_empty(
    board: &mut Board,
    catalog: &MissionCatalog,
    slot: SlotKey,
    count: usize,
    engine_seed: u64,
) -> bool {
    if !board.slot(slot).proposals.is_empty() {
        return false;
    }
    generate_for_slot(board, catalog, slot, count, engine_seed);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn board() -> Board {
        Board::new("user-1", Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap())
    }

    #[test]
    fn generation_offers_whole_slot_catalog() {
        let catalog = MissionCatalog::load_from_static();
        let mut board = board();
        generate_for_slot(&mut board, &catalog, SlotKey::Hunt, 4, 42);

        let proposals = &board.slot(SlotKey::Hunt).proposals;
        assert_eq!(proposals.len(), catalog.for_slot(SlotKey::Hunt).count());
        for proposal in proposals {
            assert_eq!(proposal.template.slot, SlotKey::Hunt);
        }
    }

    #[test]
    fn regeneration_mints_fresh_ids() {
        let catalog = MissionCatalog::load_from_static();
        let mut board = board();
        generate_for_slot(&mut board, &catalog, SlotKey::Main, 4, 42);
        let first_ids: Vec<String> = board
            .slot(SlotKey::Main)
            .proposals
            .iter()
            .map(|p| p.id.clone())
            .collect();

        generate_for_slot(&mut board, &catalog, SlotKey::Main, 4, 42);
        for proposal in &board.slot(SlotKey::Main).proposals {
            assert!(
                !first_ids.contains(&proposal.id),
                "proposal identity must be generation-scoped"
            );
        }
    }

    #[test]
    fn generation_is_deterministic_per_seed() {
        let catalog = MissionCatalog::load_from_static();
        let mut first = board();
        let mut second = board();
        generate_for_slot(&mut first, &catalog, SlotKey::Skill, 4, 7);
        generate_for_slot(&mut second, &catalog, SlotKey::Skill, 4, 7);
        assert_eq!(
            first.slot(SlotKey::Skill).proposals,
            second.slot(SlotKey::Skill).proposals
        );
    }

    #[test]
    fn regenerate_if_empty_is_a_noop_with_candidates() {
        let catalog = MissionCatalog::load_from_static();
        let mut board = board();
        assert!(regenerate_if_empty(&mut board, &catalog, SlotKey::Hunt, 4, 1));
        let before = board.slot(SlotKey::Hunt).proposals.clone();
        assert!(!regenerate_if_empty(&mut board, &catalog, SlotKey::Hunt, 4, 1));
        assert_eq!(board.slot(SlotKey::Hunt).proposals, before);
    }

    #[test]
    fn empty_catalog_yields_empty_batch() {
        let catalog = MissionCatalog::empty();
        let mut board = board();
        generate_for_slot(&mut board, &catalog, SlotKey::Main, 4, 1);
        assert!(board.slot(SlotKey::Main).proposals.is_empty());
    }
}
