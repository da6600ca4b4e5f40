//! marmot project scaffolding
//!
//! `marmot init` turns the current directory into a runnable webapp: it records
//! the answers in `.marmotrc`, unpacks the vendored `WEB-INF` skeleton and wires
//! the selected template engines into `web.xml`.

pub mod error;
pub mod init;
pub mod questions;
pub mod rc;
pub mod templates;
pub mod vendor;
pub mod web_xml;

pub use error::{ScaffoldError, ScaffoldResult};
pub use init::{run_init, InitNotice, InitReport};
pub use questions::{complete_answers, Answer, InquirePrompter, Prompter, Question, QuestionKind};
pub use rc::{Engine, InitOptions, MarmotRc, TagSyntax};
pub use web_xml::WebXml;
