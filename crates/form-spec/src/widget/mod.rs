mod button;
mod choice;
mod datepicker;
mod flex;
mod kind;
mod slider;

pub use button::Button;
pub use choice::{CheckboxGroup, RadioGroup, checkbox_value};
pub use datepicker::DatePicker;
pub use flex::FlexStyle;
pub use kind::{WidgetKind, resolve_widget};
pub use slider::Slider;
