use rand::prelude::{IteratorRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use std::collections::VecDeque;
use std::num::NonZeroUsize;

/// Board value of a cell occupied by the snake.
pub const BODY: f32 = -1.0;
/// Board value of the cell holding food.
pub const FOOD: f32 = 1.0;
/// Number of actions a snake can take.
pub const ACTION_COUNT: usize = 4;

const DEFAULT_SIDE: NonZeroUsize = match NonZeroUsize::new(10) {
    Some(side) => side,
    None => unreachable!(),
};

/// A discrete-action episode an agent can play.
///
/// States are flat vectors of a fixed length,
/// and actions are indices in `0..ACTION_COUNT`.
pub trait Environment {
    /// Starts a new episode and returns its first state.
    fn reset(&mut self) -> Vec<f32>;
    /// Applies an action and returns the resulting state.
    /// Does nothing once the episode is done.
    fn step(&mut self, action: usize) -> Vec<f32>;
    /// Whether the episode has ended.
    fn done(&self) -> bool;
    /// Score of the episode so far.
    fn score(&self) -> f32;
}

/// Snake game parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    pub width: NonZeroUsize,
    pub height: NonZeroUsize,
    /// Steps the snake may take without eating
    /// before the episode ends.
    pub hunger_limit: usize,
    /// Score awarded for every step survived,
    /// on top of one point per food eaten.
    pub survival_reward: f32,
}

impl GameConfig {
    /// Number of cells on the board, which is
    /// also the length of every state.
    pub fn cell_count(&self) -> usize {
        self.width.get() * self.height.get()
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            width: DEFAULT_SIDE,
            height: DEFAULT_SIDE,
            hunger_limit: 100,
            survival_reward: 0.01,
        }
    }
}

/// Movement directions, in action order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Right,
    Left,
    Up,
    Down,
}

impl Direction {
    /// Maps an action index to a direction.
    /// Out of range actions keep the snake going right.
    pub fn from_action(action: usize) -> Direction {
        match action {
            1 => Direction::Left,
            2 => Direction::Up,
            3 => Direction::Down,
            _ => Direction::Right,
        }
    }
}

/// Grid snake. The board is seen as a flat vector in
/// row-major order, with [`BODY`] for the snake, [`FOOD`]
/// for the food and 0 for empty cells.
///
/// Running into a wall or into the snake ends the episode,
/// as does going [`hunger_limit`] steps without eating.
/// The snake grows by one cell for every food eaten.
///
/// [`hunger_limit`]: GameConfig::hunger_limit
#[derive(Clone, Debug)]
pub struct Game {
    config: GameConfig,
    /// Head first.
    body: VecDeque<(usize, usize)>,
    food: Option<(usize, usize)>,
    points: usize,
    steps: usize,
    hunger: usize,
    done: bool,
    seed: u64,
    rng: ChaCha8Rng,
}

impl Game {
    /// Creates a game whose episodes all place the
    /// snake and food in the same sequence, given the
    /// same actions.
    pub fn new(config: GameConfig, seed: u64) -> Game {
        let mut game = Game {
            config,
            body: VecDeque::new(),
            food: None,
            points: 0,
            steps: 0,
            hunger: 0,
            done: false,
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        };
        game.reset();
        game
    }

    /// Food eaten in the current episode.
    pub fn points(&self) -> usize {
        self.points
    }

    /// Steps taken in the current episode.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Snake cells, head first.
    pub fn body(&self) -> impl Iterator<Item = &(usize, usize)> {
        self.body.iter()
    }

    pub fn food(&self) -> Option<(usize, usize)> {
        self.food
    }

    /// Returns the flattened board.
    pub fn state(&self) -> Vec<f32> {
        let mut board = vec![0.0; self.config.cell_count()];
        for &cell in &self.body {
            board[self.index(cell)] = BODY;
        }
        if let Some(food) = self.food {
            board[self.index(food)] = FOOD;
        }
        board
    }

    fn index(&self, (x, y): (usize, usize)) -> usize {
        y * self.config.width.get() + x
    }

    /// Cell reached from `(x, y)` in `direction`,
    /// or `None` if it is off the board.
    fn neighbor(&self, (x, y): (usize, usize), direction: Direction) -> Option<(usize, usize)> {
        let (x, y) = match direction {
            Direction::Right => (x.checked_add(1)?, y),
            Direction::Left => (x.checked_sub(1)?, y),
            Direction::Up => (x, y.checked_sub(1)?),
            Direction::Down => (x, y.checked_add(1)?),
        };
        (x < self.config.width.get() && y < self.config.height.get()).then(|| (x, y))
    }

    /// Places food on a random free cell. A board
    /// with no free cell left is a won game.
    fn place_food(&mut self) {
        let width = self.config.width.get();
        let body = &self.body;
        self.food = (0..self.config.cell_count())
            .map(|i| (i % width, i / width))
            .filter(|cell| !body.contains(cell))
            .choose(&mut self.rng);
        if self.food.is_none() {
            self.done = true;
        }
    }
}

impl Environment for Game {
    /// Restarts the game with a single-cell snake
    /// on a random cell. The random sequence restarts
    /// from the game's seed.
    fn reset(&mut self) -> Vec<f32> {
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
        let start = (
            self.rng.gen_range(0..self.config.width.get()),
            self.rng.gen_range(0..self.config.height.get()),
        );
        self.body = VecDeque::from(vec![start]);
        self.points = 0;
        self.steps = 0;
        self.hunger = 0;
        self.done = false;
        self.place_food();
        self.state()
    }

    fn step(&mut self, action: usize) -> Vec<f32> {
        if self.done {
            return self.state();
        }
        self.steps += 1;
        self.hunger += 1;

        let head = match self.body.front() {
            Some(&head) => head,
            None => {
                self.done = true;
                return self.state();
            }
        };
        let head = match self.neighbor(head, Direction::from_action(action)) {
            Some(cell) if !self.body.contains(&cell) => cell,
            _ => {
                self.done = true;
                return self.state();
            }
        };

        self.body.push_front(head);
        if self.food == Some(head) {
            self.points += 1;
            self.hunger = 0;
            self.place_food();
        } else {
            self.body.pop_back();
        }
        if self.hunger >= self.config.hunger_limit {
            self.done = true;
        }
        self.state()
    }

    fn done(&self) -> bool {
        self.done
    }

    fn score(&self) -> f32 {
        self.points as f32 + self.config.survival_reward * self.steps as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config(width: usize, height: usize) -> GameConfig {
        GameConfig {
            width: NonZeroUsize::new(width).unwrap(),
            height: NonZeroUsize::new(height).unwrap(),
            hunger_limit: 50,
            survival_reward: 0.5,
        }
    }

    /// Puts the snake at `body` and the food at `food`.
    fn arrange(game: &mut Game, body: &[(usize, usize)], food: (usize, usize)) {
        game.body = body.iter().copied().collect();
        game.food = Some(food);
    }

    #[test]
    fn initial_state() {
        let mut game = Game::new(GameConfig::default(), 3);
        let state = game.reset();
        assert_eq!(state.len(), 100);
        assert_eq!(state.iter().filter(|&&v| v == BODY).count(), 1);
        assert_eq!(state.iter().filter(|&&v| v == FOOD).count(), 1);
        assert_eq!(state.iter().filter(|&&v| v == 0.0).count(), 98);
        assert!(!game.done());
        assert_eq!(game.score(), 0.0);
    }

    #[test]
    fn episodes_repeat_per_seed() {
        let mut a = Game::new(GameConfig::default(), 11);
        let mut b = Game::new(GameConfig::default(), 11);
        for action in [0, 0, 3, 3, 1, 2] {
            assert_eq!(a.step(action), b.step(action));
        }
        assert_eq!(a.reset(), b.reset());
        assert_eq!(a.reset(), Game::new(GameConfig::default(), 11).state());
    }

    #[test]
    fn moves_in_action_direction() {
        let mut game = Game::new(small_config(5, 5), 0);
        arrange(&mut game, &[(2, 2)], (0, 0));
        let expected = [(3, 2), (2, 2), (2, 1), (2, 2)];
        for (action, cell) in (0..ACTION_COUNT).zip(expected) {
            game.step(action);
            assert_eq!(game.body().next(), Some(&cell));
            assert_eq!(game.body().count(), 1);
        }
        assert!(!game.done());
        assert_eq!(game.steps(), 4);
    }

    #[test]
    fn wall_ends_episode() {
        let mut game = Game::new(small_config(3, 3), 0);
        arrange(&mut game, &[(0, 1)], (2, 2));
        let state = game.step(1);
        assert!(game.done());
        assert_eq!(game.body().next(), Some(&(0, 1)));

        // Steps after the end change nothing.
        assert_eq!(game.step(0), state);
        assert_eq!(game.steps(), 1);
    }

    #[test]
    fn eating_grows_snake() {
        let mut game = Game::new(small_config(4, 4), 0);
        arrange(&mut game, &[(1, 1)], (2, 1));
        let state = game.step(0);
        assert_eq!(game.points(), 1);
        assert_eq!(game.body().copied().collect::<Vec<_>>(), vec![(2, 1), (1, 1)]);
        assert_eq!(state.iter().filter(|&&v| v == BODY).count(), 2);

        let food = game.food().unwrap();
        assert!(game.body().all(|&cell| cell != food));
        assert_eq!(game.score(), 1.0 + 0.5);
    }

    #[test]
    fn biting_itself_ends_episode() {
        let mut game = Game::new(small_config(5, 5), 0);
        arrange(&mut game, &[(2, 2), (3, 2), (3, 3), (2, 3)], (0, 0));
        game.step(3);
        assert!(game.done());
    }

    #[test]
    fn hunger_ends_episode() {
        let config = GameConfig {
            hunger_limit: 3,
            ..small_config(10, 1)
        };
        let mut game = Game::new(config, 0);
        arrange(&mut game, &[(0, 0)], (9, 0));
        game.step(0);
        game.step(0);
        assert!(!game.done());
        game.step(0);
        assert!(game.done());
        assert_eq!(game.score(), 3.0 * 0.5);
    }

    #[test]
    fn filling_board_wins() {
        let mut game = Game::new(small_config(2, 1), 0);
        arrange(&mut game, &[(0, 0)], (1, 0));
        game.step(0);
        assert_eq!(game.points(), 1);
        assert_eq!(game.food(), None);
        assert!(game.done());
        assert_eq!(game.state(), vec![BODY, BODY]);
    }
}
