pub mod loader;
mod record;

pub use loader::{read_holidays, HolidaySource};
pub use record::{Category, EnrichedHoliday, HolidayDocument, HolidayRecord};
