//! Minimal XML-RPC codec: string-parameter calls out, a single scalar or a fault back.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::BridgeError;

/// Scalar result of a remote call.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
}

const SCALAR_TAGS: &[&str] = &[
    "boolean",
    "int",
    "i4",
    "i8",
    "double",
    "string",
    "nil",
    "base64",
    "dateTime.iso8601",
];

// ── Encoding ──

/// Encode a `methodCall` whose parameters are all strings.
pub fn encode_call(method: &str, params: &[&str]) -> String {
    let mut body = String::from("<?xml version=\"1.0\"?>\n<methodCall><methodName>");
    body.push_str(&quick_xml::escape::escape(method));
    body.push_str("</methodName><params>");
    for param in params {
        body.push_str("<param><value><string>");
        body.push_str(&quick_xml::escape::escape(*param));
        body.push_str("</string></value></param>");
    }
    body.push_str("</params></methodCall>");
    body
}

// ── Decoding ──

/// Decode a `methodResponse`. Returns the first parameter (or `Nil`), or the fault as an error.
pub fn decode_response(body: &str) -> Result<Value, BridgeError> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut decoder = Decoder::default();
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                decoder.start(name);
            }
            Ok(Event::Empty(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                decoder.start(name);
                decoder.end()?;
            }
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| BridgeError::Protocol(e.to_string()))?;
                decoder.text.push_str(&text);
            }
            Ok(Event::CData(c)) => {
                decoder.text.push_str(&String::from_utf8_lossy(&c));
            }
            Ok(Event::End(_)) => decoder.end()?,
            Ok(Event::Eof) => break,
            Err(e) => return Err(BridgeError::Protocol(e.to_string())),
            _ => {}
        }
    }
    decoder.finish()
}

#[derive(Default)]
struct Decoder {
    stack: Vec<String>,
    text: String,
    /// Set once the innermost `<value>` produced a scalar, so its closing tag adds nothing.
    produced: bool,
    saw_response: bool,
    in_fault: bool,
    member: Option<String>,
    fault_code: Option<i64>,
    fault_string: Option<String>,
    result: Option<Value>,
}

impl Decoder {
    fn start(&mut self, name: String) {
        match name.as_str() {
            "methodResponse" => self.saw_response = true,
            "fault" => self.in_fault = true,
            "value" => self.produced = false,
            _ => {}
        }
        self.text.clear();
        self.stack.push(name);
    }

    fn end(&mut self) -> Result<(), BridgeError> {
        let name = self.stack.pop().unwrap_or_default();
        let text = std::mem::take(&mut self.text);
        match name.as_str() {
            "name" => self.member = Some(text),
            "value" if !self.produced => {
                // Untyped `<value>` is a string.
                self.produced = true;
                self.assign(Value::String(text));
            }
            tag if SCALAR_TAGS.contains(&tag) => {
                let value = parse_scalar(tag, text)?;
                self.produced = true;
                self.assign(value);
            }
            _ => {}
        }
        Ok(())
    }

    fn assign(&mut self, value: Value) {
        if self.in_fault {
            match (self.member.as_deref(), value) {
                (Some("faultCode"), Value::Int(code)) => self.fault_code = Some(code),
                (Some("faultString"), Value::String(s)) => self.fault_string = Some(s),
                _ => {}
            }
        } else if self.result.is_none() && self.stack.iter().any(|t| t == "param") {
            self.result = Some(value);
        }
    }

    fn finish(self) -> Result<Value, BridgeError> {
        if !self.saw_response {
            return Err(BridgeError::Protocol("not an XML-RPC methodResponse".into()));
        }
        if self.in_fault {
            return Err(BridgeError::Fault {
                code: self.fault_code.unwrap_or(0),
                message: self.fault_string.unwrap_or_default(),
            });
        }
        Ok(self.result.unwrap_or(Value::Nil))
    }
}

fn parse_scalar(tag: &str, text: String) -> Result<Value, BridgeError> {
    let bad = |kind: &str, text: &str| BridgeError::Protocol(format!("bad {kind} value '{text}'"));
    match tag {
        "boolean" => match text.trim() {
            "1" | "true" => Ok(Value::Bool(true)),
            "0" | "false" => Ok(Value::Bool(false)),
            other => Err(bad("boolean", other)),
        },
        "int" | "i4" | "i8" => text
            .trim()
            .parse()
            .map(Value::Int)
            .map_err(|_| bad("int", &text)),
        "double" => text
            .trim()
            .parse()
            .map(Value::Double)
            .map_err(|_| bad("double", &text)),
        "nil" => Ok(Value::Nil),
        _ => Ok(Value::String(text)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_string_params_escaped() {
        let body = encode_call("update_model", &["/data/a&b <1>.pdb"]);
        assert!(body.starts_with("<?xml"));
        assert!(body.contains("<methodName>update_model</methodName>"));
        assert!(body.contains("<string>/data/a&amp;b &lt;1&gt;.pdb</string>"));
    }

    #[test]
    fn encodes_no_params() {
        let body = encode_call("close_maps", &[]);
        assert!(body.contains("<params></params>"));
    }

    #[test]
    fn decodes_boolean() {
        let body = "<?xml version='1.0'?>\n<methodResponse><params><param>\
                    <value><boolean>1</boolean></value></param></params></methodResponse>";
        assert_eq!(decode_response(body).unwrap(), Value::Bool(true));
    }

    #[test]
    fn decodes_untyped_string() {
        let body = "<methodResponse><params><param><value>ok</value></param></params></methodResponse>";
        assert_eq!(decode_response(body).unwrap(), Value::String("ok".into()));
    }

    #[test]
    fn decodes_nil_and_empty() {
        let nil = "<methodResponse><params><param><value><nil/></value></param></params></methodResponse>";
        assert_eq!(decode_response(nil).unwrap(), Value::Nil);
        let none = "<methodResponse><params></params></methodResponse>";
        assert_eq!(decode_response(none).unwrap(), Value::Nil);
    }

    #[test]
    fn decodes_int() {
        let body = "<methodResponse><params><param><value><i4>-3</i4></value></param></params></methodResponse>";
        assert_eq!(decode_response(body).unwrap(), Value::Int(-3));
    }

    #[test]
    fn decodes_fault() {
        let body = r#"<?xml version="1.0"?>
<methodResponse>
  <fault>
    <value>
      <struct>
        <member><name>faultCode</name><value><int>1</int></value></member>
        <member><name>faultString</name><value><string>&lt;type 'exceptions.IOError'&gt;:no such file</string></value></member>
      </struct>
    </value>
  </fault>
</methodResponse>"#;
        match decode_response(body).unwrap_err() {
            BridgeError::Fault { code, message } => {
                assert_eq!(code, 1);
                assert!(message.contains("no such file"));
                assert!(message.starts_with("<type"));
            }
            other => panic!("expected fault, got {other:?}"),
        }
    }

    #[test]
    fn rejects_non_response() {
        assert!(matches!(
            decode_response("<html><body>502</body></html>"),
            Err(BridgeError::Protocol(_))
        ));
    }

    #[test]
    fn rejects_bad_boolean() {
        let body = "<methodResponse><params><param><value><boolean>yes</boolean></value></param></params></methodResponse>";
        assert!(matches!(
            decode_response(body),
            Err(BridgeError::Protocol(_))
        ));
    }
}
