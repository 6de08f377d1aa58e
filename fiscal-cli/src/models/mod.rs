mod forms;

pub use forms::{CompareForm, CompareRequest, CrossBorderForm, CrossBorderRequest};
