//! The page record handed to downstream consumers.
//!
//! Field names serialize in camelCase; enum values in snake_case.

use serde::Serialize;
use std::collections::BTreeMap;

/// Structured, importance-ranked summary of one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRecord {
    pub url: String,
    pub title: String,
    pub timestamp_seconds: f64,
    pub structure_summary: StructureSummary,
    /// Selected meta tags by name (`description`, `og:title`, ...).
    pub meta: BTreeMap<String, String>,
    pub functional_areas: Vec<FunctionalArea>,
    pub forms: Vec<Form>,
    pub interactive_elements: InteractiveElements,
    pub content_structure: Vec<ContentBlock>,
    pub messages: Vec<Message>,
    pub input_controls: Vec<InputControl>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StructureSummary {
    pub has_header: bool,
    pub has_footer: bool,
    pub has_navigation: bool,
    pub has_main_content: bool,
    pub has_sidebar: bool,
    pub has_forms: bool,
    pub form_count: u32,
    pub link_count: u32,
    pub button_count: u32,
    pub input_count: u32,
    pub image_count: u32,
    pub table_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportanceTier {
    High,
    Medium,
    Low,
}

impl ImportanceTier {
    /// Larger is more important.
    pub fn rank(self) -> u8 {
        match self {
            ImportanceTier::High => 3,
            ImportanceTier::Medium => 2,
            ImportanceTier::Low => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BoundingBox {
    pub top: i64,
    pub left: i64,
    pub width: i64,
    pub height: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionalArea {
    #[serde(rename = "type")]
    pub area_type: String,
    pub tag: String,
    pub element_id: String,
    pub class_name: String,
    /// At most 100 characters.
    pub text_snippet: String,
    pub importance_tier: ImportanceTier,
    pub score: f64,
    pub interactive_child_count: u32,
    pub bounding_box: BoundingBox,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormPurpose {
    Login,
    Registration,
    Search,
    Contact,
    Authentication,
    DataEntry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldPurpose {
    Password,
    RequiredField,
    Email,
    Name,
    Phone,
    Address,
    Date,
    Option,
    Selection,
    Dropdown,
    TextArea,
    TextField,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Form {
    pub id: String,
    pub action: String,
    pub method: String,
    pub purpose: FormPurpose,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    #[serde(rename = "type")]
    pub field_type: String,
    pub name: String,
    pub id: String,
    pub placeholder: String,
    pub required: bool,
    pub disabled: bool,
    pub purpose: FieldPurpose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementPurpose {
    Login,
    Registration,
    Submission,
    Search,
    Cancellation,
    Deletion,
    Editing,
    Creation,
    Viewing,
    NavigationForward,
    NavigationBackward,
    PrimaryAction,
    SecondaryAction,
    DangerAction,
    WarningAction,
    SuccessAction,
    Interaction,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Position {
    pub top: i64,
    pub left: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InteractiveElements {
    pub buttons: Vec<Button>,
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Button {
    pub text: String,
    #[serde(rename = "type")]
    pub button_type: String,
    pub purpose: ElementPurpose,
    pub is_form_submit: bool,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub text: String,
    pub href: String,
    pub purpose: ElementPurpose,
    pub is_external: bool,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Heading {
    pub level: u8,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListGroup {
    /// `ul` or `ol`.
    #[serde(rename = "type")]
    pub list_type: String,
    pub items: Vec<String>,
}

/// One block of the page's semantic structure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "content", rename_all = "snake_case")]
pub enum ContentBlock {
    HeadingHierarchy(Vec<Heading>),
    Lists(Vec<ListGroup>),
    /// Main-content paragraph previews, each at most 100 characters plus `...`.
    Paragraphs(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Error,
    Warning,
    Success,
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputControl {
    #[serde(rename = "type")]
    pub control_type: String,
    pub purpose: FieldPurpose,
    pub name: String,
    pub id: String,
    pub placeholder: String,
    pub required: bool,
    pub disabled: bool,
    pub read_only: bool,
}

/// A sub-probe that failed and was replaced by its default value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeFailure {
    pub probe: String,
    pub message: String,
}
