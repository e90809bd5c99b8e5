//! Round lifecycle: building a round, scoring, and regenerating after a win.
//!
//! All input reaches the controller as `Command`s queued between ticks; each
//! `tick` drains the queue, steps the engine once and reacts to the contacts it
//! reports, so everything happens on one thread in a fixed order.

use std::collections::VecDeque;

use log::{debug, info};
use rand::Rng;

use crate::generator::generate;
use crate::geometry::{derive_geometry, Layout, Point, WallKind};
use crate::grid::{Dimensions, Dir, Pos};
use crate::physics::{BodyId, BodySpec, BodyTag, Contact, PhysicsEngine, Style};
use crate::player::Player;

/// Distance an avatar travels per tick after a key press.
pub const AVATAR_SPEED: f32 = 8.0;
/// Avatar radius relative to the cell height.
pub const AVATAR_RADIUS_SCALE: f32 = 0.3;
/// Gravity switched on once a round is won.
pub const WIN_GRAVITY: Point = Point::new(0.0, 1.0);

/// Everything the controller needs to know to build rounds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatchSettings {
    pub dims: Dimensions,
    pub width: f32,
    pub height: f32,
    /// Ticks between a win and the next round.
    pub restart_ticks: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Move(Player, Dir),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Active,
    Resolved { winner: Player, restart_in: u32 },
}

/// The bodies owned by the current round.
#[derive(Clone, Debug)]
pub struct Round {
    pub number: u32,
    pub layout: Layout,
    /// Perimeter bodies. They stay static for the whole round.
    pub boundary: Vec<BodyId>,
    /// Maze wall bodies, released on a win.
    pub walls: Vec<BodyId>,
    pub goal: BodyId,
    pub avatars: [BodyId; 2],
}

impl Round {
    pub fn avatar(&self, player: Player) -> BodyId {
        self.avatars[player.index()]
    }

    /// Every body created for this round.
    pub fn body_ids(&self) -> impl Iterator<Item = BodyId> + '_ {
        self.boundary
            .iter()
            .chain(&self.walls)
            .copied()
            .chain([self.goal])
            .chain(self.avatars)
    }
}

#[derive(Clone, Debug)]
pub struct MatchState {
    round: Round,
    scores: [u32; 2],
    can_win: bool,
    phase: Phase,
}

impl MatchState {
    pub fn round(&self) -> &Round {
        &self.round
    }

    pub fn scores(&self) -> [u32; 2] {
        self.scores
    }

    /// Whether the next goal contact scores.
    pub fn can_win(&self) -> bool {
        self.can_win
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn score(&self, player: Player) -> u32 {
        self.scores[player.index()]
    }

    pub fn winner(&self) -> Option<Player> {
        match self.phase {
            Phase::Active => None,
            Phase::Resolved { winner, .. } => Some(winner),
        }
    }

    pub fn winner_label(&self) -> Option<String> {
        self.winner().map(|p| format!("{} wins", p.name()))
    }
}

/// What happened during one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickOutcome {
    pub winner: Option<Player>,
    pub regenerated: bool,
}

pub struct MatchController<E, R> {
    settings: MatchSettings,
    engine: E,
    rng: R,
    state: MatchState,
    queue: VecDeque<Command>,
}

impl<E: PhysicsEngine, R: Rng> MatchController<E, R> {
    /// Starts the first round straight away.
    pub fn new(settings: MatchSettings, mut engine: E, mut rng: R) -> Self {
        engine.clear();
        engine.set_gravity(Point::ZERO);
        let round = build_round(&settings, &mut engine, &mut rng, 1);
        Self {
            settings,
            engine,
            rng,
            state: MatchState {
                round,
                scores: [0, 0],
                can_win: true,
                phase: Phase::Active,
            },
            queue: VecDeque::new(),
        }
    }

    pub fn settings(&self) -> &MatchSettings {
        &self.settings
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn push(&mut self, command: Command) {
        self.queue.push_back(command);
    }

    pub fn tick(&mut self) -> TickOutcome {
        while let Some(command) = self.queue.pop_front() {
            self.apply(command);
        }

        let contacts = self.engine.step();
        let winner = self.handle_contacts(&contacts);

        let mut regenerated = false;
        if winner.is_none() {
            if let Phase::Resolved { restart_in, .. } = &mut self.state.phase {
                *restart_in = restart_in.saturating_sub(1);
                regenerated = *restart_in == 0;
            }
        }
        if regenerated {
            self.regenerate();
        }

        TickOutcome {
            winner,
            regenerated,
        }
    }

    /// Scores the first goal contact of the round. Later contacts in the same
    /// round are ignored.
    pub fn handle_contacts(&mut self, contacts: &[Contact]) -> Option<Player> {
        let mut winner = None;
        for contact in contacts {
            let Some(player) = scoring_player(contact.tag_a, contact.tag_b) else {
                continue;
            };
            if !self.state.can_win {
                debug!(
                    "ignoring goal contact by {} in round {}",
                    player.name(),
                    self.state.round.number
                );
                continue;
            }
            self.win(player);
            winner = Some(player);
        }
        winner
    }

    /// Throws the current round away and builds a new one. Scores are kept.
    pub fn regenerate(&mut self) {
        self.engine.clear();
        self.engine.set_gravity(Point::ZERO);
        let number = self.state.round.number + 1;
        self.state.round = build_round(&self.settings, &mut self.engine, &mut self.rng, number);
        self.state.can_win = true;
        self.state.phase = Phase::Active;
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::Move(player, dir) => {
                let (dr, dc) = dir.delta();
                let velocity = Point::new(dc as f32 * AVATAR_SPEED, dr as f32 * AVATAR_SPEED);
                self.engine
                    .set_velocity(self.state.round.avatar(player), velocity);
            }
        }
    }

    fn win(&mut self, player: Player) {
        self.state.can_win = false;
        self.state.scores[player.index()] += 1;
        self.state.phase = Phase::Resolved {
            winner: player,
            restart_in: self.settings.restart_ticks.max(1),
        };
        self.engine.set_gravity(WIN_GRAVITY);
        for id in self.state.round.walls.iter().copied() {
            self.engine.set_static(id, false);
        }
        self.engine.set_static(self.state.round.goal, false);
        info!(
            "{} wins round {} (green {} : blue {})",
            player.name(),
            self.state.round.number,
            self.state.score(Player::One),
            self.state.score(Player::Two)
        );
    }
}

/// The player a contact scores for, if any. Only goal/avatar pairs score.
pub fn scoring_player(a: BodyTag, b: BodyTag) -> Option<Player> {
    match (a, b) {
        (BodyTag::Goal, BodyTag::Avatar(p)) | (BodyTag::Avatar(p), BodyTag::Goal) => Some(p),
        (BodyTag::Goal, BodyTag::Goal | BodyTag::Wall | BodyTag::Boundary)
        | (BodyTag::Wall | BodyTag::Boundary, BodyTag::Goal)
        | (BodyTag::Avatar(_), BodyTag::Avatar(_) | BodyTag::Wall | BodyTag::Boundary)
        | (BodyTag::Wall | BodyTag::Boundary, BodyTag::Avatar(_))
        | (BodyTag::Wall | BodyTag::Boundary, BodyTag::Wall | BodyTag::Boundary) => None,
    }
}

fn build_round<E: PhysicsEngine, R: Rng>(
    settings: &MatchSettings,
    engine: &mut E,
    rng: &mut R,
    number: u32,
) -> Round {
    let maze = generate(settings.dims, rng);
    let layout = derive_geometry(maze.passages(), settings.width, settings.height);

    let dims = settings.dims;
    let goal_cell = Pos::new(dims.rows() / 2, dims.cols() - 1);
    let dist = maze.passages().distances(goal_cell);
    let steps = |pos: Pos| dist[pos.row][pos.col].unwrap_or(0);
    info!(
        "round {}: {}x{} maze, {} walls, goal {} steps from green and {} from blue",
        number,
        dims.rows(),
        dims.cols(),
        layout.walls.len(),
        steps(Pos::new(0, 0)),
        steps(Pos::new(dims.rows() - 1, 0))
    );
    debug!("round {} maze:\n{}", number, maze);

    let mut boundary = Vec::new();
    let mut walls = Vec::new();
    for wall in &layout.walls {
        match wall.kind {
            WallKind::Boundary => boundary.push(engine.add_body(BodySpec::rect(
                BodyTag::Boundary,
                wall.rect,
                Style::Plain,
            ))),
            WallKind::Maze => walls.push(engine.add_body(BodySpec::rect(
                BodyTag::Wall,
                wall.rect,
                Style::Orange,
            ))),
        }
    }
    let goal = engine.add_body(BodySpec::rect(BodyTag::Goal, layout.goal, Style::Red));
    let radius = layout.cell_height * AVATAR_RADIUS_SCALE;
    let avatars = Player::ALL.map(|player| {
        engine.add_body(BodySpec::circle(
            BodyTag::Avatar(player),
            layout.start(player),
            radius,
            player.style(),
        ))
    });

    Round {
        number,
        layout,
        boundary,
        walls,
        goal,
        avatars,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::World;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn settings(rows: usize, cols: usize, restart_ticks: u32) -> MatchSettings {
        MatchSettings {
            dims: Dimensions::new(rows, cols).unwrap(),
            width: 960.0,
            height: 540.0,
            restart_ticks,
        }
    }

    fn controller(rows: usize, cols: usize) -> MatchController<World, ChaCha8Rng> {
        MatchController::new(
            settings(rows, cols, 3),
            World::new(),
            ChaCha8Rng::seed_from_u64(17),
        )
    }

    fn goal_contact(ctl: &MatchController<World, ChaCha8Rng>, player: Player) -> Contact {
        let round = ctl.state().round();
        Contact {
            a: round.goal,
            b: round.avatar(player),
            tag_a: BodyTag::Goal,
            tag_b: BodyTag::Avatar(player),
        }
    }

    #[test]
    fn only_goal_and_avatar_pairs_score() {
        let tags = [
            BodyTag::Boundary,
            BodyTag::Wall,
            BodyTag::Goal,
            BodyTag::Avatar(Player::One),
            BodyTag::Avatar(Player::Two),
        ];
        for a in tags {
            for b in tags {
                let expected = match (a, b) {
                    (BodyTag::Goal, BodyTag::Avatar(p)) | (BodyTag::Avatar(p), BodyTag::Goal) => {
                        Some(p)
                    }
                    _ => None,
                };
                assert_eq!(scoring_player(a, b), expected, "{:?} {:?}", a, b);
            }
        }
    }

    #[test]
    fn first_round_places_every_body() {
        let ctl = controller(9, 12);
        let state = ctl.state();
        assert_eq!(state.round().number, 1);
        assert!(state.can_win());
        assert_eq!(state.phase(), Phase::Active);
        assert_eq!(state.round().boundary.len(), 4);
        let expected = 4 + (8 * 12 + 9 * 11) - (9 * 12 - 1) + 1 + 2;
        assert_eq!(ctl.engine().bodies().len(), expected);
        assert_eq!(ctl.engine().gravity(), Point::ZERO);
    }

    #[test]
    fn simultaneous_contacts_score_once() {
        let mut ctl = controller(3, 3);
        let contacts = [goal_contact(&ctl, Player::Two), goal_contact(&ctl, Player::One)];
        assert_eq!(ctl.handle_contacts(&contacts), Some(Player::Two));
        assert_eq!(ctl.state().scores(), [0, 1]);
        assert!(!ctl.state().can_win());

        let later = [goal_contact(&ctl, Player::One)];
        assert_eq!(ctl.handle_contacts(&later), None);
        assert_eq!(ctl.state().scores(), [0, 1]);
        assert_eq!(ctl.state().winner_label().as_deref(), Some("blue wins"));
    }

    #[test]
    fn win_releases_maze_walls_and_goal() {
        let mut ctl = controller(3, 3);
        ctl.handle_contacts(&[goal_contact(&ctl, Player::One)]);
        assert_eq!(ctl.engine().gravity(), WIN_GRAVITY);
        for body in ctl.engine().bodies() {
            match body.tag {
                BodyTag::Boundary => assert!(body.is_static),
                BodyTag::Wall | BodyTag::Goal => assert!(!body.is_static),
                BodyTag::Avatar(_) => assert!(!body.is_static),
            }
        }
    }

    #[test]
    fn perimeter_holds_the_debris_until_restart() {
        let mut ctl = MatchController::new(
            settings(3, 3, 200),
            World::new(),
            ChaCha8Rng::seed_from_u64(5),
        );
        ctl.handle_contacts(&[goal_contact(&ctl, Player::One)]);
        for _ in 0..199 {
            assert!(!ctl.tick().regenerated);
        }
        let boundary = &ctl.state().round().boundary;
        for body in ctl.engine().bodies() {
            if boundary.contains(&body.id) {
                assert!(body.is_static);
            }
            assert!(body.position.y <= 540.0, "{:?}", body);
        }
    }

    #[test]
    fn restart_replaces_every_body() {
        let mut ctl = controller(3, 3);
        let old: Vec<BodyId> = ctl.state().round().body_ids().collect();
        ctl.handle_contacts(&[goal_contact(&ctl, Player::One)]);

        let mut outcomes = Vec::new();
        for _ in 0..3 {
            outcomes.push(ctl.tick());
        }
        assert!(outcomes[..2].iter().all(|o| !o.regenerated));
        assert!(outcomes[2].regenerated);

        let state = ctl.state();
        assert_eq!(state.round().number, 2);
        assert!(state.can_win());
        assert_eq!(state.phase(), Phase::Active);
        assert_eq!(state.scores(), [1, 0]);
        assert_eq!(state.winner_label(), None);
        assert_eq!(ctl.engine().gravity(), Point::ZERO);

        let live: Vec<BodyId> = ctl.engine().bodies().iter().map(|b| b.id).collect();
        assert!(live.iter().all(|id| !old.contains(id)));
        let current: Vec<BodyId> = ctl.state().round().body_ids().collect();
        assert_eq!(live.len(), current.len());
        assert!(ctl.engine().bodies().iter().all(|b| b.is_static
            || matches!(b.tag, BodyTag::Avatar(_))));
    }

    #[test]
    fn move_sets_axis_velocity() {
        let mut ctl = controller(3, 3);
        ctl.push(Command::Move(Player::One, Dir::Down));
        ctl.push(Command::Move(Player::One, Dir::Right));
        ctl.push(Command::Move(Player::Two, Dir::Up));
        ctl.tick();
        let round = ctl.state().round();
        let one = ctl.engine().body(round.avatar(Player::One)).unwrap();
        let two = ctl.engine().body(round.avatar(Player::Two)).unwrap();
        // last key processed wins, no diagonals
        assert_eq!(one.velocity, Point::new(AVATAR_SPEED, 0.0));
        assert_eq!(two.velocity, Point::new(0.0, -AVATAR_SPEED));
        assert_eq!(one.position, Point::new(160.0 + AVATAR_SPEED, 90.0));
    }
}
