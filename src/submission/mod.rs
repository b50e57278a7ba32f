pub mod collector;
pub mod conditions;
pub mod parser;
pub mod record;
pub mod sheet;
pub mod validator;

pub use collector::FormCollector;
pub use conditions::{Condition, ConditionTable, ConditionalRule};
pub use record::{FieldValue, SubmissionRecord};
pub use sheet::SheetRow;
