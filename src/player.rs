use crate::physics::Style;

/// One of the two racers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Player {
    One,
    Two,
}

impl Player {
    pub const ALL: [Player; 2] = [Player::One, Player::Two];

    pub fn index(self) -> usize {
        match self {
            Player::One => 0,
            Player::Two => 1,
        }
    }

    /// Colour name shown in the scoreboard and the winner banner.
    pub fn name(self) -> &'static str {
        match self {
            Player::One => "green",
            Player::Two => "blue",
        }
    }

    pub fn style(self) -> Style {
        match self {
            Player::One => Style::Green,
            Player::Two => Style::Blue,
        }
    }
}
