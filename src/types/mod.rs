//! Type definitions for WeChat Open SDK entities

mod ids;
mod kind;
mod response;

pub use ids::AppId;
pub use kind::{codes, MiniProgramType, OperationKind, Scene};
pub use response::{parse_card_list, AuthResult, InvoiceCard, MiniProgramResult};
