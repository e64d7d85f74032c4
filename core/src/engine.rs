use hashbrown::HashMap;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};
use std::time::Duration;

use crate::*;

/// Presentation pacing. Authoritative state (scores, mistakes, turn, matched
/// flags, completion) never waits on these; only the flip-back of mismatched
/// cards and the reopening of input do.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Timings {
    /// Pause before a matched set stops blocking input.
    pub match_settle: Duration,
    /// Pause before mismatched cards flip back face-down.
    pub mismatch_settle: Duration,
}

impl Timings {
    /// No pacing at all; every resolution settles within the same call.
    pub const fn instant() -> Self {
        Self {
            match_settle: Duration::ZERO,
            mismatch_settle: Duration::ZERO,
        }
    }
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            match_settle: Duration::from_millis(500),
            mismatch_settle: Duration::from_millis(1000),
        }
    }
}

/// Presentation-facing notifications, drained by the owning session.
#[derive(Clone, Debug, PartialEq)]
pub enum EngineEvent {
    CursorMoved { to: Coord2 },
    Flipped { index: CardIndex },
    JokerRevealed { joker: CardIndex, pair: (CardIndex, CardIndex) },
    Matched { indices: SmallVec<[CardIndex; 3]>, joker: bool },
    /// Fired when the settle elapses and the two cards go face-down again.
    Mismatched { indices: [CardIndex; 2] },
    TurnChanged { player: Player },
    PeekStarted,
    PeekEnded,
    Completed { winner: Option<Player> },
}

#[derive(Copy, Clone, Debug, PartialEq)]
enum SettleAction {
    /// Reopen input after a match; matched cards stay face-up.
    ClearMatched,
    /// Flip the two mismatched cards back face-down.
    UnflipPair(CardIndex, CardIndex),
}

#[derive(Copy, Clone, Debug, PartialEq)]
struct PendingSettle {
    due_at: Duration,
    action: SettleAction,
}

/// Turn-taking flip/match/mismatch/joker-resolution state machine over a
/// dealt board. Driven entirely by its own virtual clock: the shell calls
/// [`MatchEngine::advance`] from its frame timer, tests call it directly.
#[derive(Clone, Debug)]
pub struct MatchEngine {
    config: GridConfig,
    board: Array2<Card>,
    flipped: SmallVec<[CardIndex; 3]>,
    matched_pairs: CardCount,
    phase: EnginePhase,
    current_player: Player,
    scores: Scores,
    cursor: Coord2,
    stats: GameStats,
    timings: Timings,
    now: Duration,
    pending: Option<PendingSettle>,
    peek_until: Option<Duration>,
    events: Vec<EngineEvent>,
}

impl MatchEngine {
    /// Builds an engine over a prepared deck; the deck length must match the
    /// configured board.
    pub fn new(config: GridConfig, deck: Vec<Card>) -> Result<Self> {
        if deck.len() != config.total_cards() as usize {
            return Err(GameError::InvalidDeckSize);
        }
        let size = config.size as usize;
        let board =
            Array2::from_shape_vec((size, size), deck).map_err(|_| GameError::InvalidDeckSize)?;
        Ok(Self {
            config,
            board,
            flipped: SmallVec::new(),
            matched_pairs: 0,
            phase: EnginePhase::default(),
            current_player: Player::default(),
            scores: Scores::default(),
            cursor: (0, 0),
            stats: GameStats::default(),
            timings: Timings::default(),
            now: Duration::ZERO,
            pending: None,
            peek_until: None,
            events: Vec::new(),
        })
    }

    pub fn set_timings(&mut self, timings: Timings) {
        self.timings = timings;
    }

    pub fn config(&self) -> GridConfig {
        self.config
    }

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    pub fn is_complete(&self) -> bool {
        self.phase.is_complete()
    }

    pub fn current_player(&self) -> Player {
        self.current_player
    }

    pub fn scores(&self) -> Scores {
        self.scores
    }

    pub fn cursor(&self) -> Coord2 {
        self.cursor
    }

    pub fn stats(&self) -> &GameStats {
        &self.stats
    }

    pub(crate) fn stats_mut(&mut self) -> &mut GameStats {
        &mut self.stats
    }

    pub fn matched_pairs(&self) -> CardCount {
        self.matched_pairs
    }

    pub fn total_pairs(&self) -> CardCount {
        self.config.pairs
    }

    /// Indices of the currently flipped, unresolved cards.
    pub fn flipped(&self) -> &[CardIndex] {
        &self.flipped
    }

    pub fn cards(&self) -> &[Card] {
        self.board.as_slice().expect("layout should be standard")
    }

    fn cards_mut(&mut self) -> &mut [Card] {
        self.board
            .as_slice_mut()
            .expect("layout should be standard")
    }

    pub fn card(&self, index: CardIndex) -> Option<&Card> {
        self.cards().get(usize::from(index))
    }

    pub fn card_at(&self, coords: Coord2) -> &Card {
        &self.board[coords.to_nd_index()]
    }

    /// Virtual time elapsed since construction.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Higher score wins; `None` on a tie. Meaningful once complete.
    pub fn winner(&self) -> Option<Player> {
        self.scores.winner()
    }

    /// Attempts to flip the card at `index`.
    ///
    /// Out-of-range indices and flips on a completed board are errors; a flip
    /// that is merely not allowed right now (card already face-up or matched,
    /// two cards unresolved, a resolution in flight) is a silent
    /// [`FlipOutcome::NoChange`].
    pub fn flip(&mut self, index: CardIndex) -> Result<FlipOutcome> {
        if usize::from(index) >= self.cards().len() {
            return Err(GameError::InvalidIndex);
        }
        if self.phase.is_complete() {
            return Err(GameError::AlreadyEnded);
        }
        if !self.phase.accepts_input() || self.flipped.len() >= 2 {
            return Ok(FlipOutcome::NoChange);
        }
        {
            let card = &self.cards()[usize::from(index)];
            if card.flipped || card.matched {
                return Ok(FlipOutcome::NoChange);
            }
        }

        self.cards_mut()[usize::from(index)].flipped = true;
        self.flipped.push(index);
        self.stats.moves += 1;
        self.events.push(EngineEvent::Flipped { index });
        log::debug!("flipped card {index}");

        if self.cards()[usize::from(index)].is_joker() {
            return Ok(self.resolve_joker(index));
        }

        if self.flipped.len() == 2 {
            return Ok(self.resolve_pair());
        }

        Ok(FlipOutcome::Flipped)
    }

    /// Moves the cursor to the cell owning `index`, then flips it.
    pub fn select(&mut self, index: CardIndex) -> Result<FlipOutcome> {
        if usize::from(index) >= self.cards().len() {
            return Err(GameError::InvalidIndex);
        }
        let to = cell_coords(index, self.config.size);
        if to != self.cursor {
            self.cursor = to;
            self.events.push(EngineEvent::CursorMoved { to });
        }
        self.flip(index)
    }

    pub fn flip_at_cursor(&mut self) -> Result<FlipOutcome> {
        self.flip(cell_index(self.cursor, self.config.size))
    }

    /// Clamps the cursor to the board; a move off the edge is a no-op.
    pub fn move_cursor(&mut self, dir: Direction) -> bool {
        let max = self.config.size - 1;
        let (x, y) = self.cursor;
        let next = match dir {
            Direction::Up => (x, y.saturating_sub(1)),
            Direction::Down => (x, y.saturating_add(1).min(max)),
            Direction::Left => (x.saturating_sub(1), y),
            Direction::Right => (x.saturating_add(1).min(max), y),
        };
        if next == self.cursor {
            return false;
        }
        self.cursor = next;
        self.events.push(EngineEvent::CursorMoved { to: next });
        true
    }

    /// Advances the virtual clock, firing a due settle action and expiring
    /// the peek window.
    pub fn advance(&mut self, dt: Duration) {
        self.now += dt;
        self.poll();
    }

    /// Starts a timed reveal window; the presentation reads faces while it
    /// is active.
    pub(crate) fn activate_peek(&mut self, duration: Duration) {
        self.stats.peek_uses += 1;
        self.peek_until = Some(self.now + duration);
        self.events.push(EngineEvent::PeekStarted);
    }

    pub fn peek_active(&self) -> bool {
        self.peek_until.is_some_and(|until| self.now < until)
    }

    /// Drains presentation events accumulated since the last call.
    pub fn take_events(&mut self) -> Vec<EngineEvent> {
        core::mem::take(&mut self.events)
    }

    /// Single left-to-right scan for the first symbol (in first-occurrence
    /// order) with two unmatched cards. Falls back to ordinary comparison
    /// when the board holds no complete pair.
    fn resolve_joker(&mut self, joker: CardIndex) -> FlipOutcome {
        self.phase = EnginePhase::ResolvingJoker;

        let mut order: Vec<SymbolToken> = Vec::new();
        let mut groups: HashMap<SymbolToken, SmallVec<[CardIndex; 2]>> = HashMap::new();
        for card in self.cards() {
            if card.matched || card.id == joker {
                continue;
            }
            let CardFace::Symbol(token) = card.face else {
                continue;
            };
            groups
                .entry(token)
                .or_insert_with(|| {
                    order.push(token);
                    SmallVec::new()
                })
                .push(card.id);
        }

        let pair = order.iter().find_map(|token| {
            let group = &groups[token];
            (group.len() >= 2).then(|| (group[0], group[1]))
        });

        let Some((a, b)) = pair else {
            log::debug!("joker {joker} found no complete pair left");
            if self.flipped.len() == 2 {
                return self.resolve_pair();
            }
            // Nothing to compare against: hold the joker as an ordinary
            // first card instead of wedging the board.
            self.phase = EnginePhase::Idle;
            return FlipOutcome::JokerHeld;
        };

        for index in [a, b] {
            let newly = {
                let card = &mut self.cards_mut()[usize::from(index)];
                let newly = !card.flipped;
                card.flipped = true;
                newly
            };
            if newly {
                self.events.push(EngineEvent::Flipped { index });
            }
        }
        self.events.push(EngineEvent::JokerRevealed {
            joker,
            pair: (a, b),
        });
        self.apply_match(smallvec![joker, a, b], true)
    }

    fn resolve_pair(&mut self) -> FlipOutcome {
        debug_assert_eq!(self.flipped.len(), 2);
        let (a, b) = (self.flipped[0], self.flipped[1]);
        self.phase = EnginePhase::ResolvingPair;

        if self.cards()[usize::from(a)].face == self.cards()[usize::from(b)].face {
            self.apply_match(smallvec![a, b], false)
        } else {
            self.apply_mismatch(a, b)
        }
    }

    /// Match bookkeeping is synchronous; a joker match counts as one pair.
    fn apply_match(&mut self, indices: SmallVec<[CardIndex; 3]>, joker: bool) -> FlipOutcome {
        for &index in &indices {
            self.cards_mut()[usize::from(index)].matched = true;
        }
        self.scores.award(self.current_player);
        self.stats.perfect_moves += 1;
        self.matched_pairs += 1;
        self.flipped.clear();
        self.events.push(EngineEvent::Matched { indices, joker });
        log::debug!(
            "{:?} matched a pair, {} of {} done",
            self.current_player,
            self.matched_pairs,
            self.config.pairs
        );

        // The player keeps the turn on a match.
        if self.matched_pairs >= self.config.pairs {
            self.phase = EnginePhase::Complete;
            self.pending = None;
            let winner = self.winner();
            self.events.push(EngineEvent::Completed { winner });
            return FlipOutcome::Won;
        }

        self.schedule(self.timings.match_settle, SettleAction::ClearMatched);
        if joker {
            FlipOutcome::JokerMatched
        } else {
            FlipOutcome::Matched
        }
    }

    /// The mismatch decision, mistake count and turn switch are synchronous;
    /// only the flip-back waits for the settle.
    fn apply_mismatch(&mut self, a: CardIndex, b: CardIndex) -> FlipOutcome {
        self.stats.mistakes += 1;
        self.current_player = self.current_player.other();
        self.events.push(EngineEvent::TurnChanged {
            player: self.current_player,
        });
        self.schedule(
            self.timings.mismatch_settle,
            SettleAction::UnflipPair(a, b),
        );
        FlipOutcome::Mismatched
    }

    fn schedule(&mut self, delay: Duration, action: SettleAction) {
        self.pending = Some(PendingSettle {
            due_at: self.now + delay,
            action,
        });
        self.poll();
    }

    fn poll(&mut self) {
        if let Some(peek_until) = self.peek_until {
            if self.now >= peek_until {
                self.peek_until = None;
                self.events.push(EngineEvent::PeekEnded);
            }
        }

        let Some(pending) = self.pending else {
            return;
        };
        if self.now < pending.due_at {
            return;
        }
        self.pending = None;
        match pending.action {
            SettleAction::ClearMatched => {
                if !self.phase.is_complete() {
                    self.phase = EnginePhase::Idle;
                }
            }
            SettleAction::UnflipPair(a, b) => {
                self.cards_mut()[usize::from(a)].flipped = false;
                self.cards_mut()[usize::from(b)].flipped = false;
                self.flipped.clear();
                if !self.phase.is_complete() {
                    self.phase = EnginePhase::Idle;
                }
                self.events.push(EngineEvent::Mismatched { indices: [a, b] });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deck_from(faces: &[CardFace]) -> Vec<Card> {
        faces
            .iter()
            .enumerate()
            .map(|(id, &face)| Card::new(id as CardIndex, face))
            .collect()
    }

    fn symbol(token: u8) -> CardFace {
        CardFace::Symbol(SymbolToken(token))
    }

    /// 3x3 board, pairs dealt side by side, joker last.
    fn engine_3x3() -> MatchEngine {
        let faces = [
            symbol(0),
            symbol(0),
            symbol(1),
            symbol(1),
            symbol(2),
            symbol(2),
            symbol(3),
            symbol(3),
            CardFace::Joker,
        ];
        let mut engine =
            MatchEngine::new(GridConfig::for_size(3).unwrap(), deck_from(&faces)).unwrap();
        engine.set_timings(Timings::default());
        engine
    }

    /// 4x4 board, pairs dealt side by side, no jokers.
    fn engine_4x4() -> MatchEngine {
        let faces: Vec<CardFace> = (0..8).flat_map(|i| [symbol(i), symbol(i)]).collect();
        MatchEngine::new(GridConfig::for_size(4).unwrap(), deck_from(&faces)).unwrap()
    }

    #[test]
    fn deck_length_is_validated() {
        let config = GridConfig::for_size(4).unwrap();
        let short = deck_from(&[symbol(0), symbol(0)]);
        assert_eq!(
            MatchEngine::new(config, short).unwrap_err(),
            GameError::InvalidDeckSize
        );
    }

    #[test]
    fn flipping_the_same_card_twice_is_a_no_op() {
        let mut engine = engine_4x4();
        assert_eq!(engine.flip(0).unwrap(), FlipOutcome::Flipped);
        assert_eq!(engine.flip(0).unwrap(), FlipOutcome::NoChange);
        assert_eq!(engine.flipped(), &[0]);
        assert_eq!(engine.stats().moves, 1);
    }

    #[test]
    fn third_flip_is_rejected_while_two_are_unresolved() {
        let mut engine = engine_4x4();
        engine.flip(0).unwrap();
        assert_eq!(engine.flip(2).unwrap(), FlipOutcome::Mismatched);
        assert_eq!(engine.flip(4).unwrap(), FlipOutcome::NoChange);
        assert_eq!(engine.flipped().len(), 2);
    }

    #[test]
    fn out_of_range_flip_is_an_error() {
        let mut engine = engine_4x4();
        assert_eq!(engine.flip(16).unwrap_err(), GameError::InvalidIndex);
        assert_eq!(engine.stats().moves, 0);
    }

    #[test]
    fn match_scores_and_keeps_the_turn() {
        let mut engine = engine_4x4();
        engine.flip(0).unwrap();
        assert_eq!(engine.flip(1).unwrap(), FlipOutcome::Matched);

        assert_eq!(engine.current_player(), Player::One);
        assert_eq!(engine.scores().of(Player::One), 1);
        assert_eq!(engine.stats().perfect_moves, 1);
        assert_eq!(engine.matched_pairs(), 1);
        assert!(engine.cards()[0].matched && engine.cards()[1].matched);

        // input stays blocked until the settle fires
        assert_eq!(engine.flip(2).unwrap(), FlipOutcome::NoChange);
        engine.advance(Duration::from_millis(500));
        assert_eq!(engine.flip(2).unwrap(), FlipOutcome::Flipped);
    }

    #[test]
    fn mismatch_counts_a_mistake_and_switches_the_turn() {
        let mut engine = engine_4x4();
        engine.flip(0).unwrap();
        assert_eq!(engine.flip(2).unwrap(), FlipOutcome::Mismatched);

        // decision and bookkeeping are synchronous
        assert_eq!(engine.stats().mistakes, 1);
        assert_eq!(engine.current_player(), Player::Two);

        // the flip-back waits for the settle
        assert!(engine.cards()[0].flipped && engine.cards()[2].flipped);
        engine.advance(Duration::from_millis(1000));
        assert!(!engine.cards()[0].flipped && !engine.cards()[2].flipped);
        assert!(engine.flipped().is_empty());

        let events = engine.take_events();
        assert!(
            events.contains(&EngineEvent::Mismatched { indices: [0, 2] }),
            "{events:?}"
        );
    }

    #[test]
    fn joker_auto_matches_the_first_pair_in_scan_order() {
        let mut engine = engine_3x3();
        assert_eq!(engine.flip(8).unwrap(), FlipOutcome::JokerMatched);

        // one pair, not two
        assert_eq!(engine.scores().of(Player::One), 1);
        assert_eq!(engine.matched_pairs(), 1);
        assert_eq!(engine.current_player(), Player::One);
        for index in [8usize, 0, 1] {
            assert!(engine.cards()[index].matched, "card {index}");
        }

        let events = engine.take_events();
        assert!(events.contains(&EngineEvent::JokerRevealed {
            joker: 8,
            pair: (0, 1),
        }));
        assert!(events.iter().any(|event| matches!(
            event,
            EngineEvent::Matched { joker: true, .. }
        )));
    }

    #[test]
    fn joker_scan_prefers_first_occurrence_order_over_completion_order() {
        // symbol 0 opens the scan but completes after symbol 1 does
        let faces = [
            symbol(0),
            symbol(1),
            symbol(1),
            symbol(0),
            symbol(2),
            symbol(2),
            symbol(3),
            symbol(3),
            CardFace::Joker,
        ];
        let mut engine =
            MatchEngine::new(GridConfig::for_size(3).unwrap(), deck_from(&faces)).unwrap();

        engine.flip(8).unwrap();
        assert!(engine.cards()[0].matched && engine.cards()[3].matched);
        assert!(!engine.cards()[1].matched && !engine.cards()[2].matched);
    }

    #[test]
    fn joker_match_clears_a_pending_first_flip() {
        let mut engine = engine_3x3();
        assert_eq!(engine.flip(2).unwrap(), FlipOutcome::Flipped);
        assert_eq!(engine.flip(8).unwrap(), FlipOutcome::JokerMatched);

        // the scan still picks the first group in encounter order, and the
        // resolution clears the flipped list wholesale
        assert!(engine.cards()[0].matched && engine.cards()[1].matched);
        assert!(engine.cards()[2].flipped && !engine.cards()[2].matched);
        assert!(engine.flipped().is_empty());
        assert_eq!(engine.scores().of(Player::One), 1);
    }

    #[test]
    fn joker_without_any_complete_pair_is_held_not_wedged() {
        // Singleton-only board: no symbol has two unmatched cards.
        let faces = [
            symbol(0),
            symbol(1),
            symbol(2),
            symbol(3),
            symbol(4),
            symbol(5),
            symbol(6),
            symbol(7),
            CardFace::Joker,
        ];
        let mut engine =
            MatchEngine::new(GridConfig::for_size(3).unwrap(), deck_from(&faces)).unwrap();
        engine.set_timings(Timings::instant());

        assert_eq!(engine.flip(8).unwrap(), FlipOutcome::JokerHeld);
        assert_eq!(engine.phase(), EnginePhase::Idle);
        assert!(engine.cards()[8].flipped);

        // falls through to ordinary comparison with the next flip
        assert_eq!(engine.flip(0).unwrap(), FlipOutcome::Mismatched);
        assert_eq!(engine.stats().mistakes, 1);
    }

    #[test]
    fn perfect_play_completes_synchronously() {
        let mut engine = engine_4x4();
        engine.set_timings(Timings::instant());

        let mut last = FlipOutcome::NoChange;
        for pair in 0..8u16 {
            engine.flip(pair * 2).unwrap();
            last = engine.flip(pair * 2 + 1).unwrap();
        }

        assert_eq!(last, FlipOutcome::Won);
        assert!(engine.is_complete());
        assert_eq!(engine.matched_pairs(), 8);
        assert_eq!(engine.stats().mistakes, 0);
        assert_eq!(engine.scores().of(Player::One), 8);
        assert_eq!(engine.winner(), Some(Player::One));
        assert_eq!(engine.flip(0).unwrap_err(), GameError::AlreadyEnded);

        let events = engine.take_events();
        assert!(events.contains(&EngineEvent::Completed {
            winner: Some(Player::One),
        }));
    }

    #[test]
    fn cursor_clamps_to_the_board() {
        let mut engine = engine_3x3();
        assert!(!engine.move_cursor(Direction::Up));
        assert!(!engine.move_cursor(Direction::Left));
        assert!(engine.move_cursor(Direction::Right));
        assert!(engine.move_cursor(Direction::Down));
        assert_eq!(engine.cursor(), (1, 1));
        for _ in 0..5 {
            engine.move_cursor(Direction::Down);
        }
        assert_eq!(engine.cursor(), (1, 2));
    }

    #[test]
    fn select_moves_the_cursor_to_the_owning_cell() {
        let mut engine = engine_3x3();
        engine.select(5).unwrap();
        assert_eq!(engine.cursor(), (2, 1));
        assert!(engine.cards()[5].flipped);
    }

    #[test]
    fn flip_at_cursor_uses_the_cursor_cell() {
        let mut engine = engine_3x3();
        engine.move_cursor(Direction::Right);
        assert_eq!(engine.flip_at_cursor().unwrap(), FlipOutcome::Flipped);
        assert!(engine.cards()[1].flipped);
    }

    #[test]
    fn peek_window_expires_on_the_virtual_clock() {
        let mut engine = engine_4x4();
        engine.activate_peek(Duration::from_secs(4));
        assert!(engine.peek_active());
        assert_eq!(engine.stats().peek_uses, 1);

        engine.advance(Duration::from_secs(4));
        assert!(!engine.peek_active());
        assert!(engine.take_events().contains(&EngineEvent::PeekEnded));
    }
}
