//! Routing directives and their resolution.
//!
//! # Design
//! A `Directive` is plain data attached to a model type or to one of its
//! field descriptors. Resolution is a fixed precedence chain: a field-level
//! destination beats the type-level default, and the type-level default beats
//! the method fallback (`GET` routes to the query string, everything else to
//! the form body).

use crate::http::HttpMethod;

/// Declarative metadata describing how a type or field is serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    Query,
    Header,
    Form,
    File(FileDirective),
    Url,
    Ignore,
    CamelCase,
}

/// Attachment naming for a `File` directive.
///
/// `name` is the multipart field name and `file_name` the file name reported
/// to the server. Either one left unset is taken from the sibling field named
/// by `file_name_field`, when that field holds a value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileDirective {
    pub name: Option<&'static str>,
    pub file_name: Option<&'static str>,
    pub file_name_field: Option<&'static str>,
}

impl FileDirective {
    pub const fn new() -> Self {
        Self {
            name: None,
            file_name: None,
            file_name_field: None,
        }
    }

    pub const fn named(name: &'static str) -> Self {
        Self {
            name: Some(name),
            file_name: None,
            file_name_field: None,
        }
    }

    pub const fn with_file_name(self, file_name: &'static str) -> Self {
        Self {
            file_name: Some(file_name),
            ..self
        }
    }

    pub const fn with_file_name_field(self, field: &'static str) -> Self {
        Self {
            file_name_field: Some(field),
            ..self
        }
    }
}

/// Where a field's value lands in the outbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializeDestination {
    Query,
    Header,
    Form,
}

/// Naming convention applied to field names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextCase {
    #[default]
    Verbatim,
    LowerCamel,
}

/// Per-object defaults produced by directive resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeDefaults {
    pub destination: SerializeDestination,
    pub case: TextCase,
}

impl TypeDefaults {
    /// Resolve the defaults of one model type for the given method.
    pub fn resolve(directives: &[Directive], method: HttpMethod) -> Self {
        let destination = explicit_destination(directives).unwrap_or(match method {
            HttpMethod::Get => SerializeDestination::Query,
            _ => SerializeDestination::Form,
        });
        Self {
            destination,
            case: text_case(directives),
        }
    }
}

/// First explicit destination tag, checked in `Query > Header > Form` order.
pub(crate) fn explicit_destination(directives: &[Directive]) -> Option<SerializeDestination> {
    if directives.contains(&Directive::Query) {
        Some(SerializeDestination::Query)
    } else if directives.contains(&Directive::Header) {
        Some(SerializeDestination::Header)
    } else if directives.contains(&Directive::Form) {
        Some(SerializeDestination::Form)
    } else {
        None
    }
}

pub(crate) fn text_case(directives: &[Directive]) -> TextCase {
    if directives.contains(&Directive::CamelCase) {
        TextCase::LowerCamel
    } else {
        TextCase::Verbatim
    }
}

/// Convert a field name to lowerCamelCase.
///
/// snake_case names are joined (`user_name` becomes `userName`). Otherwise the
/// leading run of capitals is lowered, except the capital that starts the next
/// word: `UserName` becomes `userName` and `URLPath` becomes `urlPath`.
pub fn to_lower_camel(name: &str) -> String {
    if name.contains('_') {
        let mut parts = name.split('_').filter(|p| !p.is_empty());
        let mut out = match parts.next() {
            Some(first) => lower_leading_capitals(first),
            None => return name.to_string(),
        };
        for part in parts {
            let mut chars = part.chars();
            if let Some(c) = chars.next() {
                out.extend(c.to_uppercase());
                out.push_str(chars.as_str());
            }
        }
        return out;
    }
    lower_leading_capitals(name)
}

fn lower_leading_capitals(word: &str) -> String {
    let chars: Vec<char> = word.chars().collect();
    if !chars.first().is_some_and(|c| c.is_uppercase()) {
        return word.to_string();
    }

    let mut lowered = 0;
    for i in 0..chars.len() {
        if i == 1 && !chars[i].is_uppercase() {
            break;
        }
        let next_is_lower = chars.get(i + 1).is_some_and(|c| !c.is_uppercase());
        if i > 0 && next_is_lower {
            break;
        }
        lowered = i + 1;
    }

    let mut out = String::with_capacity(word.len());
    for c in &chars[..lowered] {
        out.extend(c.to_lowercase());
    }
    out.extend(&chars[lowered..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_without_tags_defaults_to_query() {
        let d = TypeDefaults::resolve(&[], HttpMethod::Get);
        assert_eq!(d.destination, SerializeDestination::Query);
        assert_eq!(d.case, TextCase::Verbatim);
    }

    #[test]
    fn other_methods_without_tags_default_to_form() {
        for method in [HttpMethod::Post, HttpMethod::Put, HttpMethod::Delete, HttpMethod::Patch] {
            let d = TypeDefaults::resolve(&[], method);
            assert_eq!(d.destination, SerializeDestination::Form, "{method}");
        }
    }

    #[test]
    fn type_tags_beat_method_fallback() {
        let d = TypeDefaults::resolve(&[Directive::Form], HttpMethod::Get);
        assert_eq!(d.destination, SerializeDestination::Form);
        let d = TypeDefaults::resolve(&[Directive::Header], HttpMethod::Post);
        assert_eq!(d.destination, SerializeDestination::Header);
    }

    #[test]
    fn query_outranks_header_outranks_form() {
        let d = TypeDefaults::resolve(
            &[Directive::Form, Directive::Header, Directive::Query],
            HttpMethod::Post,
        );
        assert_eq!(d.destination, SerializeDestination::Query);
        assert_eq!(
            explicit_destination(&[Directive::Form, Directive::Header]),
            Some(SerializeDestination::Header)
        );
    }

    #[test]
    fn camel_case_tag_sets_naming_default() {
        let d = TypeDefaults::resolve(&[Directive::CamelCase], HttpMethod::Get);
        assert_eq!(d.case, TextCase::LowerCamel);
    }

    #[test]
    fn lower_camel_conversions() {
        assert_eq!(to_lower_camel("UserName"), "userName");
        assert_eq!(to_lower_camel("userName"), "userName");
        assert_eq!(to_lower_camel("URLPath"), "urlPath");
        assert_eq!(to_lower_camel("ID"), "id");
        assert_eq!(to_lower_camel("A"), "a");
        assert_eq!(to_lower_camel("user_name"), "userName");
        assert_eq!(to_lower_camel("Page_size_hint"), "pageSizeHint");
        assert_eq!(to_lower_camel(""), "");
    }

    #[test]
    fn file_directive_builders() {
        const AVATAR: FileDirective = FileDirective::named("avatar").with_file_name("me.png");
        assert_eq!(AVATAR.name, Some("avatar"));
        assert_eq!(AVATAR.file_name, Some("me.png"));
        assert_eq!(
            FileDirective::new().with_file_name_field("FileName").file_name_field,
            Some("FileName")
        );
    }
}
