use clap::ValueEnum;

mod calendar;
mod config_cmd;
mod day;

pub use calendar::CalendarCommand;
pub use config_cmd::ConfigCommand;
pub use day::DayCommand;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
