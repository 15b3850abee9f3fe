pub mod editor;
pub mod form;
pub mod model;

pub use editor::{ClockEditor, Preview, SubmitError};
pub use form::{Boundary, Form, FormError, FormField, compose_from_form, decompose_to_form};
pub use model::{Clock, Count};
