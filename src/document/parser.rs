//! Lenient `conference-info` parser built on quick-xml.

use crate::error::ParseError;
use crate::types::{
    ConferenceIdentity, DocumentState, MembershipDocument, MembershipState, ParticipantRecord,
};
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesRef, BytesStart, Event};
use quick_xml::Reader;
use std::collections::BTreeSet;
use std::fmt::Display;
use tracing::warn;

const ROOT_ELEMENT: &[u8] = b"conference-info";

/// Where the reader currently is in the document tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Context {
    Root,
    Users,
    User,
    Roles,
    Entry,
    DisplayText,
    /// Anything we don't interpret; its whole subtree is skipped.
    Other,
}

/// A `user` element that has been opened but not yet closed.
#[derive(Default)]
struct PendingUser {
    entity: Option<String>,
    state: MembershipState,
    roles: BTreeSet<String>,
    display_text: Option<String>,
}

#[derive(Default)]
struct DocumentBuilder {
    stack: Vec<Context>,
    entity: Option<ConferenceIdentity>,
    version: Option<u64>,
    state: DocumentState,
    participants: Vec<ParticipantRecord>,
    user: Option<PendingUser>,
    text: String,
    root_seen: bool,
    root_closed: bool,
}

impl DocumentBuilder {
    /// Resolve the context of a newly opened element and record its attributes.
    fn open(&mut self, start: &BytesStart<'_>, position: u64) -> Result<Context, ParseError> {
        let name = start.local_name();
        let parent = self.stack.last().copied();

        let context = match parent {
            None => {
                if self.root_seen {
                    return Err(malformed(position, "multiple root elements"));
                }
                if name.as_ref() != ROOT_ELEMENT {
                    return Err(ParseError::UnexpectedRoot(
                        String::from_utf8_lossy(name.as_ref()).into_owned(),
                    ));
                }
                self.root_seen = true;
                self.open_root(start, position)?;
                Context::Root
            }
            Some(Context::Root) if name.as_ref() == b"users" => Context::Users,
            Some(Context::Users) if name.as_ref() == b"user" => {
                self.user = Some(read_user(start, position)?);
                Context::User
            }
            Some(Context::User) if name.as_ref() == b"roles" => Context::Roles,
            Some(Context::User) if name.as_ref() == b"display-text" => Context::DisplayText,
            Some(Context::Roles) if name.as_ref() == b"entry" => Context::Entry,
            Some(_) => Context::Other,
        };

        if matches!(context, Context::Entry | Context::DisplayText) {
            self.text.clear();
        }

        Ok(context)
    }

    fn open_root(&mut self, start: &BytesStart<'_>, position: u64) -> Result<(), ParseError> {
        for attr in start.attributes() {
            let attr = attr.map_err(|e| malformed(position, e))?;
            let value = attr.unescape_value().map_err(|e| malformed(position, e))?;
            match attr.key.local_name().as_ref() {
                b"entity" if !value.trim().is_empty() => {
                    self.entity = Some(ConferenceIdentity::new(&*value));
                }
                b"version" => self.version = value.trim().parse().ok(),
                b"state" => self.state = DocumentState::from_attribute(&value),
                _ => {}
            }
        }

        if self.entity.is_none() {
            return Err(ParseError::MissingEntity);
        }
        Ok(())
    }

    /// Finish an element previously returned by [`DocumentBuilder::open`].
    fn close(&mut self, context: Context) {
        match context {
            Context::Root => self.root_closed = true,
            Context::User => {
                if let Some(user) = self.user.take() {
                    self.finish_user(user);
                }
            }
            Context::Entry => {
                let role = self.text.trim();
                if !role.is_empty() {
                    if let Some(user) = self.user.as_mut() {
                        user.roles.insert(role.to_string());
                    }
                }
                self.text.clear();
            }
            Context::DisplayText => {
                let display = self.text.trim();
                if !display.is_empty() {
                    if let Some(user) = self.user.as_mut() {
                        user.display_text = Some(display.to_string());
                    }
                }
                self.text.clear();
            }
            Context::Users | Context::Roles | Context::Other => {}
        }
    }

    fn finish_user(&mut self, user: PendingUser) {
        let Some(entity) = user.entity else {
            warn!(
                record = self.participants.len(),
                "Dropping user record without an entity"
            );
            return;
        };

        self.participants.push(ParticipantRecord {
            participant_identity: entity,
            membership_state: user.state,
            roles: user.roles,
            display_text: user.display_text,
        });
    }

    /// Whether text content currently belongs to a field we keep.
    fn capturing(&self) -> bool {
        matches!(
            self.stack.last(),
            Some(Context::Entry | Context::DisplayText)
        )
    }

    fn push_reference(
        &mut self,
        reference: &BytesRef<'_>,
        position: u64,
    ) -> Result<(), ParseError> {
        if let Some(ch) = reference
            .resolve_char_ref()
            .map_err(|e| malformed(position, e))?
        {
            self.text.push(ch);
            return Ok(());
        }

        let name = reference.decode().map_err(|e| malformed(position, e))?;
        match resolve_predefined_entity(&name) {
            Some(resolved) => {
                self.text.push_str(resolved);
                Ok(())
            }
            None => Err(malformed(
                position,
                format!("undefined entity reference &{};", name),
            )),
        }
    }

    /// Whether the reader is outside the root element.
    fn outside_root(&self) -> bool {
        self.stack.is_empty()
    }

    fn finish(self) -> Result<MembershipDocument, ParseError> {
        if !self.root_seen {
            return Err(ParseError::MissingRoot);
        }
        if !self.root_closed || !self.stack.is_empty() {
            return Err(ParseError::Truncated);
        }
        let entity = self.entity.ok_or(ParseError::MissingEntity)?;

        Ok(MembershipDocument {
            entity,
            version: self.version,
            state: self.state,
            participants: self.participants,
        })
    }
}

/// Read the attributes of a `user` element.
fn read_user(start: &BytesStart<'_>, position: u64) -> Result<PendingUser, ParseError> {
    let mut user = PendingUser::default();

    for attr in start.attributes() {
        let attr = attr.map_err(|e| malformed(position, e))?;
        let value = attr.unescape_value().map_err(|e| malformed(position, e))?;
        match attr.key.local_name().as_ref() {
            b"entity" => {
                let entity = value.trim();
                if !entity.is_empty() {
                    user.entity = Some(entity.to_string());
                }
            }
            b"state" => user.state = MembershipState::from_attribute(&value),
            _ => {}
        }
    }

    Ok(user)
}

fn malformed(position: u64, err: impl Display) -> ParseError {
    ParseError::Malformed {
        position,
        message: err.to_string(),
    }
}

/// Parse a raw membership document.
///
/// No schema validation happens here. Unknown elements and attributes are
/// skipped, and a `user` with no `state` counts as `full`. Only input that
/// cannot be read as a `conference-info` tree is an error.
pub fn parse(raw: &[u8]) -> Result<MembershipDocument, ParseError> {
    let text = std::str::from_utf8(raw).map_err(|e| ParseError::Encoding(e.to_string()))?;
    parse_str(text)
}

/// Parse a membership document that is already a string.
pub fn parse_str(raw: &str) -> Result<MembershipDocument, ParseError> {
    let mut reader = Reader::from_str(raw);
    let mut builder = DocumentBuilder::default();

    loop {
        let event = reader
            .read_event()
            .map_err(|e| malformed(reader.error_position(), e))?;
        let position = reader.buffer_position();

        match event {
            Event::Start(start) => {
                let context = builder.open(&start, position)?;
                builder.stack.push(context);
            }
            Event::Empty(start) => {
                let context = builder.open(&start, position)?;
                builder.close(context);
            }
            Event::End(_) => {
                if let Some(context) = builder.stack.pop() {
                    builder.close(context);
                }
            }
            Event::Text(text) if builder.outside_root() => {
                let decoded = text.decode().map_err(|e| malformed(position, e))?;
                if !decoded.trim().is_empty() {
                    return Err(malformed(position, "content outside the root element"));
                }
            }
            Event::CData(_) | Event::GeneralRef(_) if builder.outside_root() => {
                return Err(malformed(position, "content outside the root element"));
            }
            Event::Text(text) if builder.capturing() => {
                let decoded = text.decode().map_err(|e| malformed(position, e))?;
                builder.text.push_str(&decoded);
            }
            Event::CData(data) if builder.capturing() => {
                let decoded = data.decode().map_err(|e| malformed(position, e))?;
                builder.text.push_str(&decoded);
            }
            Event::GeneralRef(reference) if builder.capturing() => {
                builder.push_reference(&reference, position)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASIC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<conference-info xmlns="urn:ietf:params:xml:ns:conference-info"
                 entity="sips:conf233@example.com" state="full" version="1">
  <users>
    <user entity="sip:bob@example.com" state="full">
      <display-text>Bob Hoskins</display-text>
      <roles>
        <entry>participant</entry>
        <entry>admin</entry>
      </roles>
    </user>
    <user entity="sip:alice@example.com" state="deleted"/>
  </users>
</conference-info>"#;

    #[test]
    fn test_parse_basic_document() {
        let doc = parse_str(BASIC).unwrap();

        assert_eq!(doc.entity.as_str(), "sips:conf233@example.com");
        assert_eq!(doc.version, Some(1));
        assert_eq!(doc.state, DocumentState::Full);
        assert_eq!(doc.participants.len(), 2);

        let bob = &doc.participants[0];
        assert_eq!(bob.participant_identity, "sip:bob@example.com");
        assert_eq!(bob.membership_state, MembershipState::Full);
        assert_eq!(bob.display_text.as_deref(), Some("Bob Hoskins"));
        assert!(bob.is_admin());
        assert!(bob.roles.contains("participant"));

        let alice = &doc.participants[1];
        assert_eq!(alice.membership_state, MembershipState::Deleted);
        assert!(alice.roles.is_empty());
    }

    #[test]
    fn test_parse_accepts_bytes() {
        let doc = parse(BASIC.as_bytes()).unwrap();
        assert_eq!(doc.participants.len(), 2);
    }

    #[test]
    fn test_missing_user_state_defaults_to_full() {
        let xml = concat!(
            r#"<conference-info entity="sip:conf@x"><users>"#,
            r#"<user entity="sip:a@x"/></users></conference-info>"#,
        );
        let doc = parse_str(xml).unwrap();
        assert_eq!(doc.participants[0].membership_state, MembershipState::Full);
    }

    #[test]
    fn test_unknown_user_state_is_partial() {
        let xml = concat!(
            r#"<conference-info entity="sip:conf@x"><users>"#,
            r#"<user entity="sip:a@x" state="gone"/></users></conference-info>"#,
        );
        let doc = parse_str(xml).unwrap();
        assert_eq!(doc.participants[0].membership_state, MembershipState::Partial);
    }

    #[test]
    fn test_prefixed_namespace_and_unknown_elements() {
        let xml = r#"<ci:conference-info xmlns:ci="urn:ietf:params:xml:ns:conference-info"
    entity="sip:conf@x" extra="1">
  <ci:conference-description><ci:subject>Weekly</ci:subject></ci:conference-description>
  <ci:users>
    <ci:user entity="sip:a@x" state="partial" foo="bar">
      <ci:endpoint entity="sip:a@10.0.0.1"><ci:status>connected</ci:status></ci:endpoint>
      <ci:roles><ci:entry>admin</ci:entry></ci:roles>
      <vendor:thing xmlns:vendor="urn:vendor"><ci:entry>ignored</ci:entry></vendor:thing>
    </ci:user>
  </ci:users>
</ci:conference-info>"#;
        let doc = parse_str(xml).unwrap();
        assert_eq!(doc.participants.len(), 1);

        let record = &doc.participants[0];
        assert_eq!(record.membership_state, MembershipState::Partial);
        assert_eq!(record.roles.len(), 1);
        assert!(record.is_admin());
    }

    #[test]
    fn test_user_without_entity_is_dropped() {
        let xml = r#"<conference-info entity="sip:conf@x"><users>
            <user state="full"/>
            <user entity="sip:b@x" state="full"/>
        </users></conference-info>"#;
        let doc = parse_str(xml).unwrap();
        assert_eq!(doc.participants.len(), 1);
        assert_eq!(doc.participants[0].participant_identity, "sip:b@x");
    }

    #[test]
    fn test_role_entries_unescaped_and_trimmed() {
        let xml = r#"<conference-info entity="sip:conf@x"><users><user entity="sip:a@x">
            <roles><entry>  admin  </entry><entry>r&amp;d</entry><entry></entry></roles>
        </user></users></conference-info>"#;
        let doc = parse_str(xml).unwrap();
        let roles = &doc.participants[0].roles;
        assert!(roles.contains("admin"));
        assert!(roles.contains("r&d"));
        assert_eq!(roles.len(), 2);
    }

    #[test]
    fn test_duplicate_users_are_kept_in_order() {
        let xml = r#"<conference-info entity="sip:conf@x"><users>
            <user entity="sip:a@x" state="full"/>
            <user entity="sip:a@x" state="partial"><roles><entry>admin</entry></roles></user>
        </users></conference-info>"#;
        let doc = parse_str(xml).unwrap();
        assert_eq!(doc.participants.len(), 2);
        assert!(!doc.participants[0].is_admin());
        assert!(doc.participants[1].is_admin());
    }

    #[test]
    fn test_empty_root() {
        let doc = parse_str(r#"<conference-info entity="sip:conf@x" version="nope"/>"#).unwrap();
        assert!(doc.participants.is_empty());
        assert_eq!(doc.version, None);
    }

    #[test]
    fn test_structural_errors() {
        assert_eq!(parse_str(""), Err(ParseError::MissingRoot));
        assert_eq!(
            parse_str(r#"<presence entity="sip:x"/>"#),
            Err(ParseError::UnexpectedRoot("presence".to_string()))
        );
        assert_eq!(
            parse_str(r#"<conference-info><users/></conference-info>"#),
            Err(ParseError::MissingEntity)
        );
        assert!(matches!(
            parse(&[0xff, 0xfe, 0x00]),
            Err(ParseError::Encoding(_))
        ));
    }

    #[test]
    fn test_content_outside_root_is_malformed() {
        for xml in [
            r#"garbage<conference-info entity="sip:c@x"/>"#,
            r#"<conference-info entity="sip:c@x"/>garbage"#,
            r#"<conference-info entity="sip:c@x"/><![CDATA[x]]>"#,
            r#"<conference-info entity="sip:c@x"/>&amp;"#,
        ] {
            assert!(
                matches!(parse_str(xml), Err(ParseError::Malformed { .. })),
                "accepted {}",
                xml
            );
        }
    }

    #[test]
    fn test_whitespace_around_root_is_accepted() {
        let xml = "<?xml version=\"1.0\"?>\n<conference-info entity=\"sip:c@x\"/>\n\t ";
        let doc = parse_str(xml).unwrap();
        assert_eq!(doc.entity.as_str(), "sip:c@x");
    }

    #[test]
    fn test_undefined_entity_is_malformed() {
        let xml = r#"<conference-info entity="sip:c@x"><users><user entity="sip:a@x">
            <roles><entry>&unknown;</entry></roles>
        </user></users></conference-info>"#;
        assert!(matches!(parse_str(xml), Err(ParseError::Malformed { .. })));
    }

    #[test]
    fn test_character_references_in_roles() {
        let xml = r#"<conference-info entity="sip:c@x"><users><user entity="sip:a@x">
            <roles><entry>&#97;dmin</entry></roles>
        </user></users></conference-info>"#;
        let doc = parse_str(xml).unwrap();
        assert!(doc.participants[0].is_admin());
    }

    #[test]
    fn test_mismatched_end_tag_is_malformed() {
        let xml = r#"<conference-info entity="sip:c@x"><users></user></conference-info>"#;
        let result = parse_str(xml);
        assert!(matches!(result, Err(ParseError::Malformed { .. })));
    }

    #[test]
    fn test_truncated_document() {
        let xml = r#"<conference-info entity="sip:c@x"><users><user entity="sip:a@x">"#;
        let result = parse_str(xml);
        assert!(matches!(
            result,
            Err(ParseError::Truncated) | Err(ParseError::Malformed { .. })
        ));
    }
}
