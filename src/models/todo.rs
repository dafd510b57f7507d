//! Records transcoded from the SOAP todo service's XML responses.

use serde::{Deserialize, Serialize};

/// A todo item as the upstream SOAP service models it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Todo {
    /// Identifier assigned by the SOAP service.
    pub id: i64,

    pub title: String,

    pub description: String,

    /// Completion flag; the wire value is the XML text "true"/"false".
    pub completed: bool,
}

/// The success/message/todo triple every SOAP operation returns.
///
/// `todo` is `None` (serialized as `null`) when the response carried no
/// nested todo element, e.g. for a miss on get-by-id or for deletes.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TodoReply {
    pub success: bool,
    pub message: String,
    pub todo: Option<Todo>,
}
