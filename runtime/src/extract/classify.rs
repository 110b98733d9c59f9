//! Keyword-driven purpose classification for forms, fields, controls and
//! messages. Every rule list is evaluated in order; the first match wins.

use super::scripts::{RawField, RawForm};
use super::types::{ElementPurpose, FieldPurpose, FormPurpose, MessageKind};
use crate::keywords::KeywordMap;

const FORM_RULES: [(&str, FormPurpose); 4] = [
    ("form_login", FormPurpose::Login),
    ("form_registration", FormPurpose::Registration),
    ("form_search", FormPurpose::Search),
    ("form_contact", FormPurpose::Contact),
];

const FIELD_KEYWORD_RULES: [(&str, FieldPurpose); 5] = [
    ("field_email", FieldPurpose::Email),
    ("field_name", FieldPurpose::Name),
    ("field_phone", FieldPurpose::Phone),
    ("field_address", FieldPurpose::Address),
    ("field_date", FieldPurpose::Date),
];

const ELEMENT_TEXT_RULES: [(&str, ElementPurpose); 11] = [
    ("element_login", ElementPurpose::Login),
    ("element_registration", ElementPurpose::Registration),
    ("element_submission", ElementPurpose::Submission),
    ("element_search", ElementPurpose::Search),
    ("element_cancellation", ElementPurpose::Cancellation),
    ("element_deletion", ElementPurpose::Deletion),
    ("element_editing", ElementPurpose::Editing),
    ("element_creation", ElementPurpose::Creation),
    ("element_viewing", ElementPurpose::Viewing),
    ("element_navigation_forward", ElementPurpose::NavigationForward),
    ("element_navigation_backward", ElementPurpose::NavigationBackward),
];

const ELEMENT_CLASS_RULES: [(&str, ElementPurpose); 5] = [
    ("class_primary_action", ElementPurpose::PrimaryAction),
    ("class_secondary_action", ElementPurpose::SecondaryAction),
    ("class_danger_action", ElementPurpose::DangerAction),
    ("class_warning_action", ElementPurpose::WarningAction),
    ("class_success_action", ElementPurpose::SuccessAction),
];

const MESSAGE_RULES: [(&str, MessageKind); 3] = [
    ("message_error", MessageKind::Error),
    ("message_warning", MessageKind::Warning),
    ("message_success", MessageKind::Success),
];

pub fn form_purpose(form: &RawForm, kw: &KeywordMap) -> FormPurpose {
    let haystacks = [
        form.action.as_str(),
        form.id.as_str(),
        form.class_name.as_str(),
        form.button_text.as_str(),
    ];
    for (category, purpose) in FORM_RULES {
        if kw.matches_any(category, &haystacks) {
            return purpose;
        }
    }
    let has_password = form.has_password
        || form
            .fields
            .iter()
            .any(|f| f.field_type.eq_ignore_ascii_case("password"));
    if has_password {
        FormPurpose::Authentication
    } else {
        FormPurpose::DataEntry
    }
}

pub fn field_purpose(field: &RawField, kw: &KeywordMap) -> FieldPurpose {
    if field.field_type.eq_ignore_ascii_case("password") {
        return FieldPurpose::Password;
    }
    if field.required {
        return FieldPurpose::RequiredField;
    }
    let haystacks = [
        field.name.as_str(),
        field.id.as_str(),
        field.placeholder.as_str(),
        field.label.as_str(),
    ];
    for (category, purpose) in FIELD_KEYWORD_RULES {
        if kw.matches_any(category, &haystacks) {
            return purpose;
        }
    }
    match (field.field_type.to_ascii_lowercase().as_str(), field.tag.as_str()) {
        ("checkbox", _) => FieldPurpose::Option,
        ("radio", _) => FieldPurpose::Selection,
        (_, "select") => FieldPurpose::Dropdown,
        (_, "textarea") => FieldPurpose::TextArea,
        _ => FieldPurpose::TextField,
    }
}

/// Purpose of a button or link from its visible text, then its classes.
pub fn element_purpose(text: &str, class_name: &str, kw: &KeywordMap) -> ElementPurpose {
    ELEMENT_TEXT_RULES
        .iter()
        .find(|(category, _)| kw.matches(category, text))
        .or_else(|| {
            ELEMENT_CLASS_RULES
                .iter()
                .find(|(category, _)| kw.matches(category, class_name))
        })
        .map(|(_, purpose)| *purpose)
        .unwrap_or(ElementPurpose::Interaction)
}

pub fn message_kind(class_name: &str, kw: &KeywordMap) -> MessageKind {
    MESSAGE_RULES
        .iter()
        .find(|(category, _)| kw.matches(category, class_name))
        .map(|(_, kind)| *kind)
        .unwrap_or(MessageKind::Info)
}
