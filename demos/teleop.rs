// Keyboard teleop: WASD joystick, QEZC diagonals, R/F speed, Space stop, T start, Esc quit
//
// Usage: cargo run --example teleop -- [chair_info.json]
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::info;

use chair_zenoh_runtime::config::{topic_commands, IDENTITY_PATH, MAX_SPEED, MIN_SPEED};
use chair_zenoh_runtime::identity::ChairIdentity;
use chair_zenoh_runtime::messages::CommandEnvelope;

const STICK_STEP: i32 = 20; // joystick units per key press
const SPEED_STEP: u8 = 10; // percent per R/F press
const INPUT_TIMEOUT_MS: u64 = 300; // Recenter the stick after this much time with no input

fn now_ms() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as f64)
        .unwrap_or_default()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(IDENTITY_PATH));
    let identity = ChairIdentity::load(&path).ok_or("no chair identity found, start the runtime first")?;

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;
    let publisher = session.declare_publisher(topic_commands(&identity.id)).await?;

    info!("Driving chair {}", identity.code);
    info!("Controls: WASD=stick, Q/E/Z/C=diagonals, R/F=speed, Space=stop, T=start, Esc=quit");

    enable_raw_mode()?;
    let result = run_teleop(&publisher).await;
    disable_raw_mode()?;

    result
}

async fn send(
    publisher: &zenoh::pubsub::Publisher<'_>,
    command: &str,
    value: Option<Value>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let envelope = CommandEnvelope::new(command, value, now_ms());
    publisher.put(serde_json::to_string(&envelope)?).await?;
    Ok(())
}

async fn run_teleop(
    publisher: &zenoh::pubsub::Publisher<'_>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut speed: u8 = 50;

    // Persistent stick state
    let (mut x, mut y) = (0i32, 0i32);
    let mut last_stick_input = Instant::now();
    let mut centered = true;

    send(publisher, "start", None).await?;

    loop {
        // Poll for key with 20ms timeout (50Hz effective rate)
        if event::poll(Duration::from_millis(20))? {
            if let Event::Key(KeyEvent { code, kind, .. }) = event::read()? {
                let pressed = kind == KeyEventKind::Press || kind == KeyEventKind::Repeat;
                if !pressed {
                    continue;
                }

                match code {
                    // Stick - nudge and refresh timestamp
                    KeyCode::Char('w') => y = (y + STICK_STEP).min(100),
                    KeyCode::Char('s') => y = (y - STICK_STEP).max(-100),
                    KeyCode::Char('a') => x = (x - STICK_STEP).max(-100),
                    KeyCode::Char('d') => x = (x + STICK_STEP).min(100),

                    // Named diagonals
                    KeyCode::Char('q') => send(publisher, "direction", Some(json!("forward-left"))).await?,
                    KeyCode::Char('e') => send(publisher, "direction", Some(json!("forward-right"))).await?,
                    KeyCode::Char('z') => send(publisher, "direction", Some(json!("backward-left"))).await?,
                    KeyCode::Char('c') => send(publisher, "direction", Some(json!("backward-right"))).await?,

                    // Speed control
                    KeyCode::Char('r') => {
                        speed = speed.saturating_add(SPEED_STEP).min(MAX_SPEED);
                        info!("Speed: {}%", speed);
                        send(publisher, "speed", Some(json!(speed))).await?;
                    }
                    KeyCode::Char('f') => {
                        speed = speed.saturating_sub(SPEED_STEP).max(MIN_SPEED);
                        info!("Speed: {}%", speed);
                        send(publisher, "speed", Some(json!(speed))).await?;
                    }

                    KeyCode::Char(' ') => {
                        (x, y) = (0, 0);
                        centered = true;
                        send(publisher, "stop", None).await?;
                    }
                    KeyCode::Char('t') => send(publisher, "start", None).await?,

                    // Quit
                    KeyCode::Esc => break,

                    _ => {}
                }

                if matches!(code, KeyCode::Char('w' | 'a' | 's' | 'd')) {
                    last_stick_input = Instant::now();
                    centered = false;
                    send(publisher, "joystick", Some(json!({"x": x, "y": y}))).await?;
                }
            }
        }

        // Recenter the stick if no movement input for INPUT_TIMEOUT_MS
        if !centered && last_stick_input.elapsed() > Duration::from_millis(INPUT_TIMEOUT_MS) {
            (x, y) = (0, 0);
            centered = true;
            send(publisher, "joystick", Some(json!({"x": 0, "y": 0}))).await?;
        }
    }

    send(publisher, "stop", None).await?;
    Ok(())
}
