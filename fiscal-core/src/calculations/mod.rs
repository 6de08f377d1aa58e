//! Payroll, contractor and foreign-income tax engines.
//!
//! Every engine here is a pure function of its input and a
//! [`FiscalSchedule`]: no I/O, no shared state, deterministic output.

pub mod bracket_table;
pub mod common;
pub mod comparison;
pub mod contractor;
pub mod cross_border;
pub mod payroll;
pub mod schedule;

pub use bracket_table::{BracketTable, BracketTableError};
pub use comparison::{BenefitsInput, ComparisonError, EmploymentComparator, EmploymentComparison};
pub use contractor::{ContractorCalculator, ContractorInput, ContractorResult};
pub use cross_border::{
    CrossBorderCalculator, CrossBorderInput, CrossBorderResult, PresumedProfitResult, SimplesAnnex,
    SimplifiedRegimeResult,
};
pub use payroll::{PayrollCalculator, PayrollResult};
pub use schedule::{FiscalSchedule, ScheduleError};
