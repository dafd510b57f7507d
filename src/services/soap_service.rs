//! SOAP adapter for the todo backend.
//!
//! Builds SOAP 1.1 envelopes for the five RPC operations the upstream
//! service exposes, posts each with a quoted `SOAPAction` header, and
//! parses the XML response back into plain structs. SOAP stacks disagree
//! on namespace prefixes (`soap:`, `soap11env:`, ...), so element lookups
//! always go through local names.
//!
//! Parsing never fails the HTTP call: a response with an unexpected shape
//! degrades to a `success: false` reply with a generic message, and the
//! root cause goes to the log.

use crate::models::todo::{Todo, TodoReply};
use quick_xml::Reader;
use quick_xml::events::Event;
use thiserror::Error;
use tracing::{debug, error};

const SOAP_ENVELOPE_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
const SOAP_SERVICE_NS: &str = "todo.soap.service";

/// How much of the WSDL the connectivity probe returns.
const WSDL_PREVIEW_CHARS: usize = 200;

const PARSE_FAILURE_MESSAGE: &str = "Error parsing response";

#[derive(Debug, Error)]
pub enum SoapError {
    /// Transport failure or non-2xx response; carries the response body
    /// (or the underlying error message) verbatim.
    #[error("SOAP request failed: {0}")]
    Request(String),

    /// The connectivity probe could not reach the service.
    #[error("{0}")]
    Unreachable(String),
}

pub type SoapResult<T> = Result<T, SoapError>;

/// Client for the SOAP todo service. Cheap to clone; the underlying
/// `reqwest::Client` shares its connection pool.
#[derive(Clone)]
pub struct SoapService {
    client: reqwest::Client,
    base_url: String,
}

impl SoapService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Connectivity probe: fetch the WSDL and return its first
    /// `WSDL_PREVIEW_CHARS` characters, independent of the business ops.
    pub async fn probe(&self) -> SoapResult<String> {
        let url = format!("{}/?wsdl", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| SoapError::Unreachable(err.to_string()))?;

        if !response.status().is_success() {
            return Err(SoapError::Unreachable(format!(
                "unexpected status {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|err| SoapError::Unreachable(err.to_string()))?;
        let preview: String = body.chars().take(WSDL_PREVIEW_CHARS).collect();
        Ok(format!("{}...", preview))
    }

    pub async fn get_all_todos(&self) -> SoapResult<Vec<TodoReply>> {
        let xml = self
            .call("get_all_todos", "<tns:get_all_todos></tns:get_all_todos>".into())
            .await?;
        Ok(parse_todo_list(&xml))
    }

    pub async fn get_todo(&self, todo_id: i64) -> SoapResult<TodoReply> {
        let body = format!("<tns:get_todo><tns:todo_id>{}</tns:todo_id></tns:get_todo>", todo_id);
        let xml = self.call("get_todo", body).await?;
        Ok(parse_single_reply(&xml, "get_todo"))
    }

    pub async fn create_todo(&self, title: &str, description: &str) -> SoapResult<TodoReply> {
        let body = format!(
            "<tns:create_todo><tns:title>{}</tns:title><tns:description>{}</tns:description></tns:create_todo>",
            xml_escape(title),
            xml_escape(description)
        );
        let xml = self.call("create_todo", body).await?;
        Ok(parse_single_reply(&xml, "create_todo"))
    }

    pub async fn update_todo(
        &self,
        todo_id: i64,
        title: &str,
        description: &str,
        completed: bool,
    ) -> SoapResult<TodoReply> {
        let body = format!(
            concat!(
                "<tns:update_todo>",
                "<tns:todo_id>{}</tns:todo_id>",
                "<tns:title>{}</tns:title>",
                "<tns:description>{}</tns:description>",
                "<tns:completed>{}</tns:completed>",
                "</tns:update_todo>"
            ),
            todo_id,
            xml_escape(title),
            xml_escape(description),
            completed
        );
        let xml = self.call("update_todo", body).await?;
        Ok(parse_single_reply(&xml, "update_todo"))
    }

    pub async fn delete_todo(&self, todo_id: i64) -> SoapResult<TodoReply> {
        let body = format!(
            "<tns:delete_todo><tns:todo_id>{}</tns:todo_id></tns:delete_todo>",
            todo_id
        );
        let xml = self.call("delete_todo", body).await?;
        Ok(parse_single_reply(&xml, "delete_todo"))
    }

    /// Wrap `body` in a SOAP 1.1 envelope, POST it, and return the raw
    /// response XML. Non-2xx responses surface their body as the error.
    async fn call(&self, action: &str, body: String) -> SoapResult<String> {
        let envelope = format!(
            concat!(
                r#"<?xml version="1.0" encoding="utf-8"?>"#,
                r#"<soap:Envelope xmlns:soap="{}" xmlns:tns="{}">"#,
                "<soap:Body>{}</soap:Body>",
                "</soap:Envelope>"
            ),
            SOAP_ENVELOPE_NS, SOAP_SERVICE_NS, body
        );

        debug!("dispatching SOAP action `{}` to {}", action, self.base_url);

        let response = self
            .client
            .post(&self.base_url)
            .header("Content-Type", "text/xml; charset=utf-8")
            .header("SOAPAction", format!("\"{}\"", action))
            .body(envelope)
            .send()
            .await
            .map_err(|err| SoapError::Request(err.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| SoapError::Request(err.to_string()))?;

        if !status.is_success() {
            return Err(SoapError::Request(text));
        }

        Ok(text)
    }
}

/// Minimal element tree built from a SOAP response. Only local names and
/// text content survive; attributes and namespaces are dropped.
#[derive(Debug, Default)]
struct XmlNode {
    name: String,
    text: String,
    children: Vec<XmlNode>,
}

impl XmlNode {
    /// Parse a document into a synthetic root whose children are the
    /// top-level elements.
    fn parse(xml: &str) -> anyhow::Result<XmlNode> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut stack = vec![XmlNode::default()];
        loop {
            match reader.read_event()? {
                Event::Start(start) => {
                    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
                    stack.push(XmlNode {
                        name,
                        ..XmlNode::default()
                    });
                }
                Event::Empty(start) => {
                    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
                    let node = XmlNode {
                        name,
                        ..XmlNode::default()
                    };
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(node);
                    }
                }
                Event::Text(text) => {
                    let value = text.unescape()?;
                    if let Some(node) = stack.last_mut() {
                        node.text.push_str(&value);
                    }
                }
                Event::End(_) => {
                    let node = stack.pop().unwrap_or_default();
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(node),
                        None => anyhow::bail!("unbalanced end tag"),
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if stack.len() != 1 {
            anyhow::bail!("unclosed element at end of document");
        }
        Ok(stack.remove(0))
    }

    fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> {
        self.children.iter().filter(move |c| c.name == name)
    }

    fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(|c| c.text.as_str())
    }
}

/// Result shapes a SOAP list response can take after parsing. Resolved to
/// a uniform `Vec<TodoReply>` immediately so downstream code never sees
/// the single/many distinction.
#[derive(Debug)]
enum TodoResponses {
    Empty,
    Single(TodoReply),
    Many(Vec<TodoReply>),
}

impl TodoResponses {
    fn into_vec(self) -> Vec<TodoReply> {
        match self {
            TodoResponses::Empty => Vec::new(),
            TodoResponses::Single(reply) => vec![reply],
            TodoResponses::Many(replies) => replies,
        }
    }
}

/// Walk `Envelope -> Body -> <op>Response -> <op>Result`.
fn soap_result<'a>(doc: &'a XmlNode, op: &str) -> Option<&'a XmlNode> {
    doc.child("Envelope")?
        .child("Body")?
        .child(&format!("{}Response", op))?
        .child(&format!("{}Result", op))
}

fn collect_todo_responses(result: &XmlNode) -> TodoResponses {
    let mut replies: Vec<TodoReply> =
        result.children_named("TodoResponse").map(parse_reply).collect();
    match replies.len() {
        0 => TodoResponses::Empty,
        1 => TodoResponses::Single(replies.remove(0)),
        _ => TodoResponses::Many(replies),
    }
}

fn parse_reply(node: &XmlNode) -> TodoReply {
    TodoReply {
        success: node.child_text("success") == Some("true"),
        message: node.child_text("message").unwrap_or_default().to_string(),
        todo: node.child("todo").and_then(parse_todo),
    }
}

fn parse_todo(node: &XmlNode) -> Option<Todo> {
    Some(Todo {
        id: node.child_text("id")?.trim().parse().ok()?,
        title: node.child_text("title").unwrap_or_default().to_string(),
        description: node.child_text("description").unwrap_or_default().to_string(),
        completed: node.child_text("completed") == Some("true"),
    })
}

/// Parse a `get_all_todos` response into a uniform list. A single
/// `TodoResponse` element and an array of them produce the same shape;
/// parse failures degrade to an empty list.
fn parse_todo_list(xml: &str) -> Vec<TodoReply> {
    let doc = match XmlNode::parse(xml) {
        Ok(doc) => doc,
        Err(err) => {
            error!("failed to parse get_all_todos response: {}", err);
            return Vec::new();
        }
    };

    match soap_result(&doc, "get_all_todos") {
        Some(result) => collect_todo_responses(result).into_vec(),
        None => {
            error!("get_all_todos response missing Envelope/Body result path");
            Vec::new()
        }
    }
}

/// Parse a single-record response for `op`. Parse failures degrade to a
/// generic failure reply rather than an error.
fn parse_single_reply(xml: &str, op: &str) -> TodoReply {
    let parse_failure = || TodoReply {
        success: false,
        message: PARSE_FAILURE_MESSAGE.to_string(),
        todo: None,
    };

    let doc = match XmlNode::parse(xml) {
        Ok(doc) => doc,
        Err(err) => {
            error!("failed to parse {} response: {}", op, err);
            return parse_failure();
        }
    };

    match soap_result(&doc, op) {
        Some(result) => parse_reply(result),
        None => {
            error!("{} response missing Envelope/Body result path", op);
            parse_failure()
        }
    }
}

fn xml_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;

    // Shaped like a spyne response: prefixed envelope namespace, tns on
    // every element.
    fn envelope(body: &str) -> String {
        format!(
            concat!(
                r#"<?xml version='1.0' encoding='UTF-8'?>"#,
                r#"<soap11env:Envelope xmlns:soap11env="http://schemas.xmlsoap.org/soap/envelope/" "#,
                r#"xmlns:tns="todo.soap.service">"#,
                "<soap11env:Body>{}</soap11env:Body>",
                "</soap11env:Envelope>"
            ),
            body
        )
    }

    fn todo_response(id: i64, title: &str, completed: bool) -> String {
        format!(
            concat!(
                "<tns:TodoResponse>",
                "<tns:success>true</tns:success>",
                "<tns:message>Todo found</tns:message>",
                "<tns:todo>",
                "<tns:id>{}</tns:id>",
                "<tns:title>{}</tns:title>",
                "<tns:description>demo</tns:description>",
                "<tns:completed>{}</tns:completed>",
                "</tns:todo>",
                "</tns:TodoResponse>"
            ),
            id, title, completed
        )
    }

    #[test]
    fn list_with_many_records() {
        let xml = envelope(&format!(
            "<tns:get_all_todosResponse><tns:get_all_todosResult>{}{}</tns:get_all_todosResult></tns:get_all_todosResponse>",
            todo_response(1, "first", false),
            todo_response(2, "second", true)
        ));

        let replies = parse_todo_list(&xml);
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0].todo.as_ref().unwrap().id, 1);
        assert!(replies[1].todo.as_ref().unwrap().completed);
    }

    #[test]
    fn single_record_normalizes_to_one_element_list() {
        let single = envelope(&format!(
            "<tns:get_all_todosResponse><tns:get_all_todosResult>{}</tns:get_all_todosResult></tns:get_all_todosResponse>",
            todo_response(7, "only", false)
        ));
        let many = envelope(&format!(
            "<tns:get_all_todosResponse><tns:get_all_todosResult>{}{}</tns:get_all_todosResult></tns:get_all_todosResponse>",
            todo_response(7, "only", false),
            todo_response(8, "other", false)
        ));

        let from_single = parse_todo_list(&single);
        let from_many = parse_todo_list(&many);
        assert_eq!(from_single.len(), 1);
        assert_eq!(from_single[0], from_many[0]);
    }

    #[test]
    fn empty_result_yields_empty_list() {
        let xml = envelope(
            "<tns:get_all_todosResponse><tns:get_all_todosResult></tns:get_all_todosResult></tns:get_all_todosResponse>",
        );
        assert!(parse_todo_list(&xml).is_empty());
    }

    #[test]
    fn single_reply_with_todo() {
        let xml = envelope(&format!(
            "<tns:get_todoResponse><tns:get_todoResult>{}</tns:get_todoResult></tns:get_todoResponse>",
            concat!(
                "<tns:success>true</tns:success>",
                "<tns:message>Todo found</tns:message>",
                "<tns:todo>",
                "<tns:id>42</tns:id>",
                "<tns:title>answer</tns:title>",
                "<tns:description>deep thought</tns:description>",
                "<tns:completed>true</tns:completed>",
                "</tns:todo>"
            )
        ));

        let reply = parse_single_reply(&xml, "get_todo");
        assert!(reply.success);
        let todo = reply.todo.unwrap();
        assert_eq!(todo.id, 42);
        assert_eq!(todo.title, "answer");
        assert!(todo.completed);
    }

    #[test]
    fn absent_todo_element_is_none() {
        let xml = envelope(concat!(
            "<tns:get_todoResponse><tns:get_todoResult>",
            "<tns:success>false</tns:success>",
            "<tns:message>Todo not found</tns:message>",
            "</tns:get_todoResult></tns:get_todoResponse>"
        ));

        let reply = parse_single_reply(&xml, "get_todo");
        assert!(!reply.success);
        assert_eq!(reply.message, "Todo not found");
        assert!(reply.todo.is_none());
    }

    #[test]
    fn malformed_xml_degrades_to_failure_reply() {
        let reply = parse_single_reply("<Envelope><Body>", "get_todo");
        assert!(!reply.success);
        assert_eq!(reply.message, PARSE_FAILURE_MESSAGE);
        assert!(reply.todo.is_none());
    }

    #[test]
    fn malformed_xml_degrades_to_empty_list() {
        assert!(parse_todo_list("not xml at all").is_empty());
    }

    #[test]
    fn wrong_operation_path_is_a_parse_failure() {
        let xml = envelope(
            "<tns:unrelatedResponse><tns:unrelatedResult></tns:unrelatedResult></tns:unrelatedResponse>",
        );
        let reply = parse_single_reply(&xml, "get_todo");
        assert_eq!(reply.message, PARSE_FAILURE_MESSAGE);
    }

    #[test]
    fn boolean_coercion_treats_non_true_as_false() {
        let xml = envelope(concat!(
            "<tns:get_todoResponse><tns:get_todoResult>",
            "<tns:success>TRUE</tns:success>",
            "<tns:message>case matters</tns:message>",
            "</tns:get_todoResult></tns:get_todoResponse>"
        ));
        assert!(!parse_single_reply(&xml, "get_todo").success);
    }

    #[test]
    fn escaped_text_is_unescaped() {
        let xml = envelope(concat!(
            "<tns:get_todoResponse><tns:get_todoResult>",
            "<tns:success>true</tns:success>",
            "<tns:message>a &amp; b &lt;ok&gt;</tns:message>",
            "</tns:get_todoResult></tns:get_todoResponse>"
        ));
        assert_eq!(parse_single_reply(&xml, "get_todo").message, "a & b <ok>");
    }

    #[test]
    fn request_bodies_escape_user_text() {
        assert_eq!(xml_escape("a<b>&\"c\""), "a&lt;b&gt;&amp;&quot;c&quot;");
    }
}
