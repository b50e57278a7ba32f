use bytes::Bytes;
use serde_json::{Map, Value};

/// Ordered `(name, value)` pairs, as a browser builds them from a form.
pub type FormEntries = Vec<(String, String)>;

/// Read a relay body as a flat JSON object so single fields can be looked up.
///
/// Multipart and urlencoded bodies become string-valued objects (last value
/// wins for repeated names); anything without a known type is tried as JSON
/// and then as urlencoded.
pub async fn parse_body(content_type: Option<&str>, body: Bytes) -> Result<Value, String> {
    match content_type {
        Some(ct) if ct.contains("multipart/form-data") => {
            parse_multipart(ct, body).await.map(entries_to_object)
        }
        Some(ct) if ct.contains("application/x-www-form-urlencoded") => {
            parse_form_urlencoded(&body).map(entries_to_object)
        }
        Some(ct) if ct.contains("application/json") => {
            serde_json::from_slice(&body).map_err(|e| format!("Invalid JSON: {e}"))
        }
        _ => serde_json::from_slice(&body)
            .or_else(|_| parse_form_urlencoded(&body).map(entries_to_object))
            .map_err(|e| format!("Unable to parse body: {e}")),
    }
}

/// Decode a form-urlencoded body, keeping repeated names in order.
pub fn parse_form_urlencoded(body: &[u8]) -> Result<FormEntries, String> {
    std::str::from_utf8(body).map_err(|e| format!("Invalid UTF-8: {e}"))?;

    Ok(form_urlencoded::parse(body)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect())
}

/// Decode multipart form data using multer, keeping repeated names in order.
pub async fn parse_multipart(content_type: &str, body: Bytes) -> Result<FormEntries, String> {
    let boundary = multer::parse_boundary(content_type)
        .map_err(|e| format!("Missing multipart boundary: {e}"))?;

    let stream = futures_util::stream::once(async { Ok::<_, std::io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut entries = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Multipart error: {e}"))?
    {
        let name = field.name().unwrap_or("unknown").to_string();
        let value = field
            .text()
            .await
            .map_err(|e| format!("Field read error: {e}"))?;
        entries.push((name, value));
    }

    Ok(entries)
}

fn entries_to_object(entries: FormEntries) -> Value {
    let mut map = Map::new();
    for (k, v) in entries {
        map.insert(k, Value::String(v));
    }
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_urlencoded_keeps_repeated_names() {
        let entries =
            parse_form_urlencoded(b"nome=Ana&cursoInteresse=Engenharia&cursoInteresse=Direito")
                .unwrap();

        assert_eq!(
            entries,
            vec![
                ("nome".to_string(), "Ana".to_string()),
                ("cursoInteresse".to_string(), "Engenharia".to_string()),
                ("cursoInteresse".to_string(), "Direito".to_string()),
            ]
        );
    }

    const MULTIPART: &str = "multipart/form-data; boundary=XyZ";
    const MULTIPART_BODY: &str = "--XyZ\r\n\
                                  Content-Disposition: form-data; name=\"nome\"\r\n\r\n\
                                  Ana\r\n\
                                  --XyZ\r\n\
                                  Content-Disposition: form-data; name=\"turno\"\r\n\r\n\
                                  Matutino\r\n\
                                  --XyZ\r\n\
                                  Content-Disposition: form-data; name=\"secret\"\r\n\r\n\
                                  s\r\n\
                                  --XyZ--\r\n";

    #[tokio::test]
    async fn parse_body_json_and_form() {
        let json = parse_body(Some("application/json"), Bytes::from_static(br#"{"secret":"s"}"#))
            .await
            .unwrap();
        assert_eq!(json["secret"], "s");

        let form = parse_body(
            Some("application/x-www-form-urlencoded"),
            Bytes::from_static(b"secret=s&a=1"),
        )
        .await
        .unwrap();
        assert_eq!(form["secret"], "s");

        let untyped = parse_body(None, Bytes::from_static(b"secret=s")).await.unwrap();
        assert_eq!(untyped["secret"], "s");
    }

    #[tokio::test]
    async fn parse_body_rejects_garbage_json() {
        let result = parse_body(Some("application/json"), Bytes::from_static(b"{not json")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn parse_body_reads_multipart() {
        let value = parse_body(Some(MULTIPART), Bytes::from_static(MULTIPART_BODY.as_bytes()))
            .await
            .unwrap();
        assert_eq!(value["secret"], "s");
        assert_eq!(value["nome"], "Ana");
    }

    #[tokio::test]
    async fn multipart_entries() {
        let entries = parse_multipart(MULTIPART, Bytes::from_static(MULTIPART_BODY.as_bytes()))
            .await
            .unwrap();
        assert_eq!(entries[0], ("nome".to_string(), "Ana".to_string()));
        assert_eq!(entries[1], ("turno".to_string(), "Matutino".to_string()));
    }

    #[tokio::test]
    async fn multipart_without_boundary_is_an_error() {
        let result = parse_multipart("multipart/form-data", Bytes::new()).await;
        assert!(result.is_err());
    }
}
