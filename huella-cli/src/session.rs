//! Interactive command loop tying the progress engine to the terminal.
use std::io::BufRead;

use anyhow::{Context, Result};
use huella_game::{
    ChallengeCatalog, Clock, DailyChallenge, DailyError, Position, ProgressStorage, ProgressStore,
    SystemClock, hide_target, play_round,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::narration::Narrator;
use crate::weather::{WeatherService, describe};

const MENU: &str = "\nEscribe un comando: 'reto' para el reto diario, 'puntos' para ver tus puntos, \
'clima' para ver el clima, 'historial' para ver tus retos, 'salir' para salir.";

/// A command typed at the main prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Challenge,
    Points,
    Weather,
    History,
    Exit,
    Unknown(String),
}

impl Command {
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let normalized = input.trim().to_lowercase();
        match normalized.as_str() {
            "reto" => Self::Challenge,
            "puntos" => Self::Points,
            "clima" => Self::Weather,
            "historial" => Self::History,
            "salir" => Self::Exit,
            _ => Self::Unknown(normalized),
        }
    }
}

/// Whether the loop keeps going after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

const fn spot(position: Position) -> &'static str {
    match position {
        Position::Left => "a la izquierda",
        Position::Center => "al centro",
        Position::Right => "a la derecha",
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.to_lowercase().as_str(), "si" | "sí" | "s")
}

/// One interactive run: owns the progress store and every collaborator.
pub struct Session<S, W, N, I>
where
    S: ProgressStorage,
    W: WeatherService,
    N: Narrator,
    I: BufRead,
{
    store: ProgressStore<S>,
    catalog: ChallengeCatalog,
    weather: W,
    narrator: N,
    input: I,
    clock: Box<dyn Clock>,
    rng: ChaCha8Rng,
}

impl<S, W, N, I> Session<S, W, N, I>
where
    S: ProgressStorage,
    W: WeatherService,
    N: Narrator,
    I: BufRead,
{
    pub fn new(store: ProgressStore<S>, weather: W, narrator: N, input: I) -> Self {
        Self {
            store,
            catalog: ChallengeCatalog::default_catalog(),
            weather,
            narrator,
            input,
            clock: Box::new(SystemClock),
            rng: ChaCha8Rng::from_entropy(),
        }
    }

    /// Reproducible challenge draws and minigame targets.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self
    }

    #[cfg(test)]
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    #[must_use]
    pub fn with_catalog(mut self, catalog: ChallengeCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    #[must_use]
    pub const fn store(&self) -> &ProgressStore<S> {
        &self.store
    }

    /// Run until `salir` or end of input.
    ///
    /// # Errors
    ///
    /// Returns an error if reading input fails or progress cannot be saved.
    pub async fn run(&mut self) -> Result<()> {
        if self.greet()? == Flow::Exit {
            return Ok(());
        }
        if self.weather_report().await? == Flow::Exit {
            return Ok(());
        }
        loop {
            self.narrator.show(MENU);
            let Some(line) = self.ask("Comando: ")? else {
                self.farewell();
                return Ok(());
            };
            let command = Command::parse(&line);
            log::debug!("command {command:?}");
            let flow = match command {
                Command::Challenge => self.daily_challenge()?,
                Command::Points => self.report_points(),
                Command::Weather => self.weather_report().await?,
                Command::History => self.report_history(),
                Command::Exit => {
                    self.farewell();
                    Flow::Exit
                }
                Command::Unknown(_) => {
                    self.narrator
                        .say("Comando no reconocido, intenta de nuevo.");
                    Flow::Continue
                }
            };
            if flow == Flow::Exit {
                return Ok(());
            }
        }
    }

    /// Prompt and read one trimmed line. `None` at end of input.
    fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        self.narrator.prompt(prompt);
        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .context("reading terminal input")?;
        if read == 0 {
            log::debug!("end of input");
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn display_name(&self) -> String {
        self.store.record().name().unwrap_or("amigo").to_string()
    }

    fn greet(&mut self) -> Result<Flow> {
        if let Some(name) = self.store.record().name() {
            let text = format!("🌱 ¡Hola de nuevo, {name}!");
            self.narrator.say(&text);
            return Ok(Flow::Continue);
        }
        loop {
            let Some(name) = self.ask("🌱 Bienvenido a MiHuellaEco, ¿cómo te llamas?: ")? else {
                return Ok(Flow::Exit);
            };
            if name.is_empty() {
                continue;
            }
            self.store.claim_name(&name)?;
            return Ok(Flow::Continue);
        }
    }

    async fn weather_report(&mut self) -> Result<Flow> {
        if let Some(city) = self.store.record().city().map(str::to_string) {
            let report = describe(&self.weather, &city).await;
            self.narrator
                .say(&format!("El clima en tu ciudad ({city}) es: {report}"));
        } else {
            let Some(city) = self.ask("🌦️ Ingresa tu ciudad para ver el clima: ")? else {
                return Ok(Flow::Exit);
            };
            if city.is_empty() {
                self.narrator
                    .say("Sin una ciudad no puedo consultar el clima.");
                return Ok(Flow::Continue);
            }
            self.store.set_city(&city)?;
            let report = describe(&self.weather, &city).await;
            self.narrator
                .say(&format!("El clima en {city} es: {report}"));
        }

        let Some(answer) = self.ask("¿Quieres consultar el clima de otra ciudad? (si/no): ")? else {
            return Ok(Flow::Exit);
        };
        if is_yes(&answer) {
            let Some(other) = self.ask("Ingresa la otra ciudad: ")? else {
                return Ok(Flow::Exit);
            };
            if !other.is_empty() {
                let report = describe(&self.weather, &other).await;
                self.narrator
                    .say(&format!("El clima en {other} es: {report}"));
            }
        }
        Ok(Flow::Continue)
    }

    fn report_points(&mut self) -> Flow {
        let record = self.store.record();
        let text = format!(
            "Actualmente tienes {} puntos acumulados y has reducido {:.1} kilogramos de CO2.",
            record.points(),
            record.co2_total()
        );
        self.narrator.say(&text);
        Flow::Continue
    }

    fn report_history(&mut self) -> Flow {
        let history = self.store.record().history();
        if history.is_empty() {
            self.narrator.say("Aún no tienes retos registrados.");
            return Flow::Continue;
        }
        let lines: Vec<String> = history
            .iter()
            .map(|entry| {
                let mark = if entry.completed { "✅" } else { "❌" };
                format!(
                    "{} {mark} {} ({:.1} kg CO2)",
                    entry.date, entry.challenge_text, entry.co2_value
                )
            })
            .collect();
        let completed = self.store.record().completed_days();
        self.narrator.show(&lines.join("\n"));
        self.narrator.say(&format!(
            "Has cumplido {completed} de {} retos.",
            lines.len()
        ));
        Flow::Continue
    }

    fn daily_challenge(&mut self) -> Result<Flow> {
        let name = self.display_name();
        let today = self.clock.today();
        let challenge = match DailyChallenge::offer(&self.store, &self.catalog, today, &mut self.rng)
        {
            Ok(challenge) => challenge.clone(),
            Err(DailyError::AlreadyAttempted { .. }) => {
                self.narrator
                    .say(&format!("{name}, ya completaste el reto de hoy."));
                return Ok(Flow::Continue);
            }
            Err(err) => return Err(err.into()),
        };

        self.narrator.say(&format!(
            "Reto de hoy para {name}: {}. Si lo cumples reduces {} kilogramos de CO2.",
            challenge.text, challenge.co2_kg
        ));
        let Some(answer) = self.ask("¿Lo cumpliste hoy? (si/no): ")? else {
            return Ok(Flow::Exit);
        };
        let outcome = DailyChallenge::resolve(&mut self.store, today, &challenge, is_yes(&answer))?;

        if outcome.completed() {
            self.narrator.say(&format!(
                "¡Genial {name}! Sumaste {} puntos. Tu CO2 total reducido es {:.1} kilogramos.",
                outcome.points_awarded, outcome.total_co2
            ));
        } else {
            self.narrator.say(&format!(
                "No pasa nada {name}, mañana tendrás otra oportunidad."
            ));
        }
        self.narrator
            .say(&format!("Total acumulado: {} puntos.", outcome.total_points));

        self.minigame()
    }

    fn minigame(&mut self) -> Result<Flow> {
        self.narrator
            .say("🎮 Minijuego ecológico: ¡Atrapa la basura antes de que llegue al río!");
        self.narrator
            .show("Instrucciones: Escribe 'izquierda', 'centro' o 'derecha' para atrapar la basura.");
        let target = hide_target(&mut self.rng);
        let answer = self.ask("¿Dónde está la basura?: ")?;
        let guess = answer.as_deref().and_then(|a| a.parse::<Position>().ok());
        let outcome = play_round(&mut self.store, target, guess)?;

        if outcome.won {
            self.narrator.say(&format!(
                "¡Genial! Atrapaste la basura. Ganaste {} puntos y redujiste {} kg de CO2.",
                outcome.points_awarded, outcome.co2_awarded
            ));
        } else {
            self.narrator.say(&format!(
                "¡Oh no! La basura estaba {} y se fue al río. No ganaste puntos esta vez. 😢",
                spot(target)
            ));
        }
        Ok(if answer.is_none() {
            Flow::Exit
        } else {
            Flow::Continue
        })
    }

    fn farewell(&mut self) {
        self.narrator
            .say("¡Hasta luego! Sigue cuidando tu huella ecológica 🌱");
    }
}
