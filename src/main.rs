#[cfg(not(feature = "std"))]
fn main() {}

#[cfg(feature = "std")]
use minesweeper_duel::{
    cli::{self, Input},
    init_logging,
    transport::tcp::TcpProvider,
    Command, Difficulty, GameConfig, GameNode, GameSession, InMemoryPersistence, Role,
    TransportSession,
};

#[cfg(feature = "std")]
use clap::{Args, Parser, Subcommand};
#[cfg(feature = "std")]
use rand::rngs::SmallRng;
#[cfg(feature = "std")]
use rand::SeedableRng;
#[cfg(feature = "std")]
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[cfg(feature = "std")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Debug)]
#[cfg(feature = "std")]
struct GameArgs {
    #[arg(long, value_enum, default_value_t = Difficulty::Medium)]
    difficulty: Difficulty,
    #[arg(long, help = "Fix RNG seed for reproducible boards (e.g., --seed 12345)")]
    seed: Option<u64>,
    /// Name of player 1. A host announces it to the guest.
    #[arg(long, default_value = "Player 1")]
    player1: String,
    /// Name of player 2. A guest announces it to the host.
    #[arg(long, default_value = "Player 2")]
    player2: String,
}

#[derive(Subcommand)]
#[cfg(feature = "std")]
enum Commands {
    /// Two players taking turns on this machine.
    Local {
        #[command(flatten)]
        game: GameArgs,
    },
    /// Host a game and wait for a peer to join. The host plays first.
    Host {
        #[arg(long, default_value = "0.0.0.0:8080")]
        bind: String,
        #[command(flatten)]
        game: GameArgs,
    },
    /// Join a game hosted by a peer.
    Join {
        #[arg(long, default_value = "127.0.0.1:8080")]
        connect: String,
        #[command(flatten)]
        game: GameArgs,
    },
}

#[cfg(feature = "std")]
fn make_rng(seed: Option<u64>) -> SmallRng {
    match seed {
        Some(s) => {
            println!("Using fixed seed: {} (boards will be reproducible)", s);
            SmallRng::seed_from_u64(s)
        }
        None => {
            let mut seed_rng = rand::rng();
            SmallRng::from_rng(&mut seed_rng)
        }
    }
}

#[cfg(feature = "std")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    let (node, config) = match cli.command {
        Commands::Local { game } => {
            let (session, config) = new_game(&game)?;
            println!("Starting hot-seat game ({:?}).", game.difficulty);
            (GameNode::local(session, make_rng(game.seed)), config)
        }
        Commands::Host { bind, game } => {
            let (session, config) = new_game(&game)?;
            let provider = TcpProvider::bind(&bind).await?;
            println!("Waiting for a peer on {}... you are player 1.", provider.local_addr()?);
            let mut transport = TransportSession::new();
            transport.listen(provider)?;
            (
                GameNode::networked(session, transport, Role::Host, make_rng(game.seed)),
                config,
            )
        }
        Commands::Join { connect, game } => {
            let (session, config) = new_game(&game)?;
            println!("Connecting to {}... you are player 2.", connect);
            let mut transport = TransportSession::new();
            transport.dial(TcpProvider::dialer(), &connect)?;
            (
                GameNode::networked(session, transport, Role::Guest, make_rng(game.seed)),
                config,
            )
        }
    };

    let mut views = node.subscribe();
    let (tx, rx) = mpsc::channel(16);
    let node_task = tokio::spawn(node.run(rx));
    let printer = tokio::spawn(async move {
        loop {
            let view = views.borrow_and_update().clone();
            println!("\n{}", cli::render_view(&view));
            if views.changed().await.is_err() {
                break;
            }
        }
    });

    println!("{}", cli::HELP);
    let (rows, cols) = (config.rows, config.cols);
    tokio::task::spawn_blocking(move || read_commands(tx, rows, cols)).await??;
    node_task.await??;
    printer.abort();
    Ok(())
}

#[cfg(feature = "std")]
fn new_game(args: &GameArgs) -> anyhow::Result<(GameSession, GameConfig)> {
    let config = args.difficulty.config();
    let session = GameSession::new(config, &args.player1, &args.player2)?
        .with_persistence(Box::new(InMemoryPersistence::new()));
    Ok((session, config))
}

/// Forward stdin lines to the node until `quit`, end of input, or the node
/// stops.
#[cfg(feature = "std")]
fn read_commands(tx: mpsc::Sender<Command>, rows: usize, cols: usize) -> anyhow::Result<()> {
    let stdin = std::io::stdin();
    let mut line = String::new();
    loop {
        line.clear();
        if stdin.read_line(&mut line)? == 0 {
            return Ok(());
        }
        if line.trim().is_empty() {
            continue;
        }
        let command = match cli::parse_input(&line, rows, cols) {
            Ok(Input::Reveal((row, col))) => Command::Reveal { row, col },
            Ok(Input::Flag((row, col))) => Command::ToggleFlag { row, col },
            Ok(Input::Reset) => Command::Reset,
            Ok(Input::Quit) => return Ok(()),
            Ok(Input::Help) => {
                println!("{}", cli::HELP);
                continue;
            }
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };
        if tx.blocking_send(command).is_err() {
            return Ok(());
        }
    }
}
