use std::env;
use std::fs::File;
use std::io::{self, Stdout};
use std::thread;
use std::time::{Duration, Instant};

use crossterm::cursor::{Hide, Show};
use crossterm::event;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use log::{info, LevelFilter};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use maze_race::config::Config;
use maze_race::game::MatchController;
use maze_race::input::{self, Action};
use maze_race::physics::{PhysicsEngine, World};
use maze_race::render::{self, Renderer};
use maze_race::{Error, Result};

fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_logging(&config)?;

    let mut stdout = io::stdout();
    terminal::enable_raw_mode()?;
    stdout.execute(EnterAlternateScreen)?;
    stdout.execute(Hide)?;

    let result = run(&mut stdout, &config);

    stdout.execute(Show)?;
    stdout.execute(LeaveAlternateScreen)?;
    terminal::disable_raw_mode()?;
    result
}

/// Logs go to `MAZE_RACE_LOG_FILE` when set, since the game owns the terminal.
fn init_logging(config: &Config) -> Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("off"));
    if let Some(path) = &config.log_file {
        let file = File::create(path)
            .map_err(|e| Error::Logger(format!("{}: {}", path.display(), e)))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
        if env::var_os("RUST_LOG").is_none() {
            builder.filter_level(LevelFilter::Info);
        }
    }
    builder.try_init().map_err(|e| Error::Logger(e.to_string()))
}

fn run(stdout: &mut Stdout, config: &Config) -> Result<()> {
    let seed = config.seed.unwrap_or_else(rand::random);
    info!(
        "starting {}x{} match with seed {}",
        config.dims.rows(),
        config.dims.cols(),
        seed
    );
    let mut game = MatchController::new(
        config.match_settings(),
        World::new(),
        ChaCha8Rng::seed_from_u64(seed),
    );
    let world = (game.settings().width, game.settings().height);
    let mut renderer = Renderer::new();
    let frame_time = config.frame_time();
    let mut last_tick = Instant::now();

    loop {
        let frame_start = Instant::now();
        while event::poll(Duration::from_millis(0))? {
            match input::action_for_event(&event::read()?) {
                Some(Action::Quit) => return Ok(()),
                Some(Action::Command(command)) => game.push(command),
                None => {}
            }
        }

        if last_tick.elapsed() >= config.tick {
            last_tick = Instant::now();
            game.tick();
        }

        let hud = render::hud_line(game.state());
        renderer.draw(
            stdout,
            terminal::size()?,
            &hud,
            game.engine().bodies(),
            world,
        )?;

        let elapsed = frame_start.elapsed();
        if elapsed < frame_time {
            thread::sleep(frame_time - elapsed);
        }
    }
}
