//! Трекинг состояний логических модулей.
//!
//! - `state`: именованное состояние с входным и завершающим callback-ами.
//! - `machine`: реестр модулей, переходы состояний и рассылка уведомлений
//!   о переходах через шину.

pub mod machine;
pub mod state;

pub use machine::StateMachine;
pub use state::{State, StateFn, StateSpec};
