// ABOUTME: Interactive scaffolding questions
// ABOUTME: Asks only what `.marmotrc` has not answered yet, through a swappable prompter

use inquire::validator::Validation;
use inquire::{MultiSelect, Select, Text};
use tracing::debug;

use crate::error::{ScaffoldError, ScaffoldResult};
use crate::rc::{
    Engine, MarmotRc, TagSyntax, DEFAULT_FREEMARKER_EXTENSION, DEFAULT_MOCK_DIR,
    DEFAULT_ROUTER_FILE, DEFAULT_TEMPLATE_DIR, DEFAULT_VELOCITY_EXTENSION,
};

#[derive(Debug, Clone, Copy)]
pub enum QuestionKind {
    Text {
        default: Option<&'static str>,
        validate: fn(&str) -> Result<(), String>,
    },
    Select {
        choices: &'static [&'static str],
    },
    MultiSelect {
        choices: &'static [&'static str],
    },
}

#[derive(Debug, Clone, Copy)]
pub struct Question {
    pub key: &'static str,
    pub message: &'static str,
    pub kind: QuestionKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Text(String),
    Choice(String),
    Choices(Vec<String>),
}

/// Something that can answer questions: a terminal, or a script in tests.
pub trait Prompter {
    fn ask(&mut self, question: &Question) -> ScaffoldResult<Answer>;
}

fn accept_any(_: &str) -> Result<(), String> {
    Ok(())
}

fn validate_router(value: &str) -> Result<(), String> {
    if value.trim().ends_with(".xml") {
        Ok(())
    } else {
        Err("You need to provide a XML format file".to_string())
    }
}

fn validate_extension(value: &str) -> Result<(), String> {
    let value = value.trim();
    if value.starts_with('.') && value.len() > 1 {
        Ok(())
    } else {
        Err("You need to provide a correct extension".to_string())
    }
}

fn validate_tools(value: &str) -> Result<(), String> {
    let value = value.trim();
    if value.is_empty() || value.ends_with(".xml") {
        Ok(())
    } else {
        Err("You need to provide a XML format file".to_string())
    }
}

const ENGINE_CHOICES: &[&str] = &["velocity", "freemarker"];
const TAG_SYNTAX_CHOICES: &[&str] = &["square_bracket", "auto_detect"];

pub const COMMON: &[Question] = &[
    Question {
        key: "engines",
        message: "Template engine:",
        kind: QuestionKind::MultiSelect {
            choices: ENGINE_CHOICES,
        },
    },
    Question {
        key: "mock",
        message: "Mock data directory:",
        kind: QuestionKind::Text {
            default: Some(DEFAULT_MOCK_DIR),
            validate: accept_any,
        },
    },
    Question {
        key: "template",
        message: "Template directory:",
        kind: QuestionKind::Text {
            default: Some(DEFAULT_TEMPLATE_DIR),
            validate: accept_any,
        },
    },
    Question {
        key: "router",
        message: "Router file path (it must be a .xml file):",
        kind: QuestionKind::Text {
            default: Some(DEFAULT_ROUTER_FILE),
            validate: validate_router,
        },
    },
];

pub const VELOCITY: &[Question] = &[
    Question {
        key: "vextension",
        message: "Velocity template file extension:",
        kind: QuestionKind::Text {
            default: Some(DEFAULT_VELOCITY_EXTENSION),
            validate: validate_extension,
        },
    },
    Question {
        key: "tools",
        message: "File path of velocity tools.xml (optional, must be a .xml file):",
        kind: QuestionKind::Text {
            default: None,
            validate: validate_tools,
        },
    },
];

pub const FREEMARKER: &[Question] = &[
    Question {
        key: "fextension",
        message: "Freemarker template file extension:",
        kind: QuestionKind::Text {
            default: Some(DEFAULT_FREEMARKER_EXTENSION),
            validate: validate_extension,
        },
    },
    Question {
        key: "tagSyntax",
        message: "Freemarker tag syntax:",
        kind: QuestionKind::Select {
            choices: TAG_SYNTAX_CHOICES,
        },
    },
];

/// Ask every question `rc` has not answered and return the completed answers.
/// Engine follow-ups are only asked for the selected engines.
pub fn complete_answers(rc: MarmotRc, prompter: &mut dyn Prompter) -> ScaffoldResult<MarmotRc> {
    let mut answers = rc;

    ask_unanswered(COMMON, &mut answers, prompter)?;

    let engines = answers.engines.clone().unwrap_or_default();
    if engines.contains(&Engine::Velocity) {
        ask_unanswered(VELOCITY, &mut answers, prompter)?;
    }
    if engines.contains(&Engine::Freemarker) {
        ask_unanswered(FREEMARKER, &mut answers, prompter)?;
    }

    Ok(answers)
}

fn ask_unanswered(
    questions: &[Question],
    answers: &mut MarmotRc,
    prompter: &mut dyn Prompter,
) -> ScaffoldResult<()> {
    for question in questions {
        if answers.is_answered(question.key) {
            debug!("'{}' already answered in .marmotrc", question.key);
            continue;
        }
        let answer = prompter.ask(question)?;
        apply_answer(answers, question, answer)?;
    }
    Ok(())
}

fn apply_answer(answers: &mut MarmotRc, question: &Question, answer: Answer) -> ScaffoldResult<()> {
    let invalid = |reason: String| ScaffoldError::InvalidAnswer {
        key: question.key.to_string(),
        reason,
    };

    match (question.key, answer) {
        ("engines", Answer::Choices(choices)) => {
            let engines = choices
                .iter()
                .map(|c| Engine::parse(c).ok_or_else(|| invalid(format!("unknown engine '{}'", c))))
                .collect::<ScaffoldResult<Vec<_>>>()?;
            answers.engines = Some(engines);
        }
        ("tagSyntax", Answer::Choice(choice)) => {
            let syntax = TagSyntax::parse(&choice)
                .ok_or_else(|| invalid(format!("unknown tag syntax '{}'", choice)))?;
            answers.tag_syntax = Some(syntax);
        }
        (key, Answer::Text(text)) => {
            if let QuestionKind::Text { validate, .. } = question.kind {
                validate(&text).map_err(invalid)?;
            }
            let text = text.trim().to_string();
            match key {
                "mock" => answers.mock = Some(text),
                "template" => answers.template = Some(text),
                "router" => answers.router = Some(text),
                "vextension" => answers.vextension = Some(text),
                "tools" => answers.tools = Some(text),
                "fextension" => answers.fextension = Some(text),
                other => return Err(invalid(format!("'{}' is not a text question", other))),
            }
        }
        (_, other) => return Err(invalid(format!("unexpected answer {:?}", other))),
    }
    Ok(())
}

/// Asks on the terminal with inquire.
#[derive(Debug, Default)]
pub struct InquirePrompter;

impl Prompter for InquirePrompter {
    fn ask(&mut self, question: &Question) -> ScaffoldResult<Answer> {
        let answer = match question.kind {
            QuestionKind::Text { default, validate } => {
                let mut prompt = Text::new(question.message).with_validator(
                    move |input: &str| -> Result<Validation, inquire::CustomUserError> {
                        Ok(match validate(input) {
                            Ok(()) => Validation::Valid,
                            Err(message) => Validation::Invalid(message.into()),
                        })
                    },
                );
                if let Some(default) = default {
                    prompt = prompt.with_default(default);
                }
                Answer::Text(prompt.prompt()?)
            }
            QuestionKind::Select { choices } => {
                Answer::Choice(Select::new(question.message, choices.to_vec()).prompt()?.to_string())
            }
            QuestionKind::MultiSelect { choices } => Answer::Choices(
                MultiSelect::new(question.message, choices.to_vec())
                    .prompt()?
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
            ),
        };
        Ok(answer)
    }
}
