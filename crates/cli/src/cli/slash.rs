//! Slash-command parsing for the chat REPL.

use tutor_domain::Mode;

pub const HELP: &str = "\
Commands:
  /mode <mode>                     Switch mode (explore, practice, code, review, test)
  /reset                           Clear this conversation and start over
  /rate <1-5> [notes]              Rate your understanding of the topic
  /exam <type> <difficulty> <score> <max>
                                   Record an exam practice score
  /help                            Show this help
  /exit, /quit                     Leave the chat";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slash {
    Mode(Mode),
    Reset,
    Rate {
        rating: u8,
        notes: String,
    },
    Exam {
        question_type: String,
        difficulty: u8,
        score: u32,
        max_score: u32,
    },
    Help,
    Exit,
    /// Recognised command with bad arguments; carries the usage line.
    Usage(&'static str),
    Unknown(String),
}

pub fn parse(input: &str) -> Slash {
    let mut words = input.split_whitespace();
    let cmd = words.next().unwrap_or_default();
    let args: Vec<&str> = words.collect();

    match cmd {
        "/exit" | "/quit" => Slash::Exit,
        "/help" => Slash::Help,
        "/reset" => Slash::Reset,
        "/mode" => match args.first().map(|m| m.parse::<Mode>()) {
            Some(Ok(mode)) => Slash::Mode(mode),
            _ => Slash::Usage("/mode <explore|practice|code|review|test>"),
        },
        "/rate" => match args.first().map(|r| r.parse::<u8>()) {
            Some(Ok(rating)) => Slash::Rate {
                rating,
                notes: args[1..].join(" "),
            },
            _ => Slash::Usage("/rate <1-5> [notes]"),
        },
        "/exam" => {
            let usage = Slash::Usage("/exam <type> <difficulty> <score> <max>");
            let [question_type, difficulty, score, max_score] = args.as_slice() else {
                return usage;
            };
            match (difficulty.parse(), score.parse(), max_score.parse()) {
                (Ok(difficulty), Ok(score), Ok(max_score)) => Slash::Exam {
                    question_type: (*question_type).to_owned(),
                    difficulty,
                    score,
                    max_score,
                },
                _ => usage,
            }
        }
        other => Slash::Unknown(other.to_owned()),
    }
}
