use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use itertools::Itertools;
use regex::Regex;
use types::{Answer, Feedback, GameType, Proceed, Scenario, ScenarioView, Segment, Strategy};

const HIGHLIGHT_START: &str = "\x1b[1;33m";
const HIGHLIGHT_END: &str = "\x1b[0m";

/// Plays from the terminal. Lines are read on a background thread so story
/// scenarios can stop waiting once their answer time runs out.
#[derive(Debug)]
pub struct InputStrategy {
    lines: Receiver<String>,
}

impl Default for InputStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl InputStrategy {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
        Self { lines: rx }
    }

    /// Blocks for the next line; `None` once stdin is closed.
    fn next_line(&self) -> Option<String> {
        self.lines.recv().ok()
    }

    fn wait_for_enter(&self, prompt: &str) -> Proceed {
        print!("{prompt} ");
        let _ = io::stdout().flush();
        match self.next_line() {
            Some(line) if is_quit(&line) => Proceed::Abandon,
            Some(_) => Proceed::Continue,
            None => Proceed::Abandon,
        }
    }
}

impl Strategy for InputStrategy {
    fn select_answer(&mut self, view: &ScenarioView<'_>) -> Answer {
        print_scenario(view);
        let deadline = view.time_limit.map(|limit| Instant::now() + limit);

        loop {
            match deadline {
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    print!("Your answer ({}s left) >> ", remaining.as_secs());
                }
                None => print!("Your answer? >> "),
            }
            let _ = io::stdout().flush();

            let line = match deadline {
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    match self.lines.recv_timeout(remaining.max(Duration::from_millis(1))) {
                        Ok(line) => line,
                        Err(RecvTimeoutError::Timeout) => {
                            println!();
                            log::info!("Answer time ran out on scenario {}", view.index + 1);
                            return Answer::TimedOut;
                        }
                        Err(RecvTimeoutError::Disconnected) => return Answer::Abandon,
                    }
                }
                None => match self.next_line() {
                    Some(line) => line,
                    None => return Answer::Abandon,
                },
            };

            match parse_answer(&line, view.scenario) {
                Ok(answer) => return answer,
                Err(err) => {
                    log::debug!("Rejected input {line:?}: {err}");
                    println!("{err}");
                }
            }
        }
    }

    fn finish_reading(&mut self, view: &ScenarioView<'_>) -> Proceed {
        println!();
        println!("--- Scenario {} of {} ---", view.index + 1, view.total);
        println!("{}", view.scenario.situation);
        self.wait_for_enter("[Enter] to continue, 'quit' to leave >>")
    }

    fn acknowledge(&mut self, view: &ScenarioView<'_>, feedback: &Feedback) -> Proceed {
        println!("{feedback}");
        if view.game_type == GameType::Story {
            println!("{}", render_highlight(&view.scenario.highlight_segments()));
        }
        if !view.scenario.explanation.is_empty() {
            println!("Why: {}", view.scenario.explanation);
        }
        self.wait_for_enter("[Enter] for the next scenario, 'quit' to leave >>")
    }

    fn retry_after_failure(&mut self, score: f64) -> Proceed {
        println!(
            "Out of HP! You reached {} XP this run.",
            types::format_points(score)
        );
        self.wait_for_enter("[Enter] to try again at reduced XP, 'quit' to leave >>")
    }
}

fn print_scenario(view: &ScenarioView<'_>) {
    println!();
    println!(
        "Scenario {}/{} | HP {} | XP {}",
        view.index + 1,
        view.total,
        view.hp,
        types::format_points(view.score)
    );
    match view.game_type {
        GameType::Quiz => println!("{}", view.scenario.situation),
        GameType::Story => {
            if let Some(question) = &view.scenario.question {
                println!("{question}");
            }
        }
    }
    println!(
        "{}",
        view.scenario
            .options
            .iter()
            .map(|opt| format!("  {}) {}", opt.key, opt.text))
            .join("\n")
    );
}

/// Renders story feedback with every highlighted occurrence colored.
pub fn render_highlight(segments: &[Segment<'_>]) -> String {
    segments
        .iter()
        .map(|segment| match segment {
            Segment::Plain(text) => text.to_string(),
            Segment::Marked(text) => format!("{HIGHLIGHT_START}{text}{HIGHLIGHT_END}"),
        })
        .join("")
}

fn is_quit(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "quit" | "exit")
}

/// Accepts an option key ("b", "option B"), a 1-based position ("2"), or
/// "quit".
pub fn parse_answer(input: &str, scenario: &Scenario) -> Result<Answer, String> {
    let input = input.trim().to_lowercase();
    if is_quit(&input) {
        return Ok(Answer::Abandon);
    }

    let key_re = Regex::new(r"^(?:option\s+)?(?<key>[a-z])$").expect("Valid key regex");
    if let Some(caps) = key_re.captures(&input) {
        let key = caps["key"].to_uppercase();
        return scenario
            .option(&key)
            .map(|opt| Answer::pick(opt.key.clone()))
            .ok_or_else(|| {
                format!(
                    "There is no option {key}; choose one of {}",
                    scenario.options.iter().map(|opt| &opt.key).join(", ")
                )
            });
    }

    let position_re = Regex::new(r"^(?<pos>[1-9])$").expect("Valid position regex");
    if let Some(caps) = position_re.captures(&input) {
        let pos: usize = caps["pos"].parse().map_err(|e| format!("{e}"))?;
        return scenario
            .options
            .get(pos - 1)
            .map(|opt| Answer::pick(opt.key.clone()))
            .ok_or_else(|| format!("There are only {} options", scenario.options.len()));
    }

    Err(format!("Unable to read an answer from {input:?}"))
}
