use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use reqwest::Client;
use shared::{
    command::{COMMAND_PREFIX, SET_META_PREFIX},
    domain::MachineState,
    protocol::CommandDelivery,
};
use tracing::{info, warn};

/// Stand-in for the embedded line controller: reports machine state to
/// the relay and polls for queued commands on a fixed cadence.
#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "http://127.0.0.1:3000")]
    base_url: String,
    /// Milliseconds between report/poll rounds.
    #[arg(long, default_value_t = 2000)]
    interval_ms: u64,
    /// Stop after this many rounds; 0 keeps running.
    #[arg(long, default_value_t = 0)]
    rounds: u64,
}

/// How many flow pulses the simulated filler advances per round.
const PULSES_PER_ROUND: u32 = 25;
/// Tank percentage consumed by each completed bottle.
const TANK_DRAIN_PER_BOTTLE: i32 = 5;

struct Machine {
    state: MachineState,
}

impl Machine {
    fn new() -> Self {
        let state = MachineState {
            emergency_stop_ok: 1,
            target_pulses: 100,
            ..MachineState::default()
        };
        Self { state }
    }

    fn apply(&mut self, qualified: &str) {
        let Some(command) = qualified.strip_prefix(COMMAND_PREFIX) else {
            warn!(%qualified, "ignoring command without CMD prefix");
            return;
        };

        if let Some(raw_meta) = command.strip_prefix(SET_META_PREFIX) {
            match raw_meta.parse::<u32>() {
                Ok(meta) => {
                    self.state.target_pulses = meta;
                    info!(meta, "batch target updated");
                }
                Err(_) => warn!(%command, "unparseable SET_META payload"),
            }
            return;
        }

        if let Some((token, bit)) = command.split_once(':') {
            let value = u8::from(bit == "1");
            match token {
                "MANUAL_CINTA" => self.state.conveyor_on = value,
                "MANUAL_BOMBA" => self.state.pump_on = value,
                "MANUAL_LED_G" => self.state.green_led_on = value,
                "MANUAL_LED_R" => self.state.red_led_on = value,
                _ => warn!(%command, "unknown manual token"),
            }
            return;
        }

        match command {
            "START" => self.start(),
            "STOP" => self.stop(),
            "RESUME" => self.resume(),
            _ => warn!(%command, "unknown command"),
        }
    }

    fn start(&mut self) {
        self.state.status = "FILLING".to_string();
        self.state.pulse_count = 0;
        self.state.bottle_present = 1;
        self.state.conveyor_on = 1;
        self.state.pump_on = 1;
        self.state.green_led_on = 1;
        self.state.red_led_on = 0;
    }

    fn stop(&mut self) {
        self.state.status = "PAUSED".to_string();
        self.state.conveyor_on = 0;
        self.state.pump_on = 0;
        self.state.green_led_on = 0;
        self.state.red_led_on = 1;
    }

    fn resume(&mut self) {
        if self.state.status != "PAUSED" {
            warn!(status = %self.state.status, "RESUME outside of pause ignored");
            return;
        }
        self.state.status = "FILLING".to_string();
        self.state.conveyor_on = 1;
        self.state.pump_on = 1;
        self.state.green_led_on = 1;
        self.state.red_led_on = 0;
    }

    /// Advances the fill simulation by one round. Filling consumes tank
    /// volume per finished bottle and parks the line when it runs dry.
    fn tick(&mut self) {
        if self.state.status != "FILLING" {
            return;
        }

        let advanced = self.state.pulse_count.saturating_add(PULSES_PER_ROUND);
        self.state.pulse_count = advanced.min(self.state.target_pulses);
        if self.state.pulse_count >= self.state.target_pulses {
            self.state.pulse_count = 0;
            self.state.tank_level_percent =
                (self.state.tank_level_percent - TANK_DRAIN_PER_BOTTLE).max(0);
            if self.state.tank_level_percent == 0 {
                self.state.status = "TANK_EMPTY".to_string();
                self.state.conveyor_on = 0;
                self.state.pump_on = 0;
                self.state.green_led_on = 0;
                self.state.red_led_on = 1;
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let client = Client::new();
    let mut machine = Machine::new();
    let mut round = 0u64;

    info!(base_url = %cli.base_url, interval_ms = cli.interval_ms, "controller simulator starting");

    loop {
        machine.tick();

        if let Err(error) = report_state(&client, &cli.base_url, &machine.state).await {
            warn!(%error, "state report failed");
        }

        match fetch_command(&client, &cli.base_url).await {
            Ok(Some(command)) => {
                info!(%command, "received command");
                machine.apply(&command);
            }
            Ok(None) => {}
            Err(error) => warn!(%error, "command poll failed"),
        }

        round += 1;
        if cli.rounds != 0 && round >= cli.rounds {
            break;
        }
        tokio::time::sleep(Duration::from_millis(cli.interval_ms)).await;
    }

    Ok(())
}

async fn report_state(client: &Client, base_url: &str, state: &MachineState) -> Result<()> {
    let response = client
        .post(format!("{base_url}/state"))
        .json(state)
        .send()
        .await?;
    if !response.status().is_success() {
        anyhow::bail!("relay rejected state report: {}", response.status());
    }
    Ok(())
}

async fn fetch_command(client: &Client, base_url: &str) -> Result<Option<String>> {
    let delivery: CommandDelivery = client
        .get(format!("{base_url}/command"))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    Ok(delivery.command)
}
