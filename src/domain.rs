//! Domain types for the form guide kiosk.

use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

/// Kind of user input that counts as activity on the touchscreen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Click,
    TouchStart,
    TouchMove,
    MouseMove,
    KeyPress,
}

impl ActivityKind {
    /// Every activity kind, in the order the display reports them.
    pub const ALL: [ActivityKind; 5] = [
        Self::Click,
        Self::TouchStart,
        Self::TouchMove,
        Self::MouseMove,
        Self::KeyPress,
    ];

    /// Get the activity kind as it appears on the input line protocol.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::TouchStart => "touchstart",
            Self::TouchMove => "touchmove",
            Self::MouseMove => "mousemove",
            Self::KeyPress => "keypress",
        }
    }

    /// Parse an activity kind from its protocol name (case-insensitive).
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(name.trim()))
    }
}

/// Identifier of a form in the catalog (newtype for type safety).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormId(String);

impl FormId {
    /// Create a new form id.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Get the form id as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FormId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A civil-registration form shown as a card on the main screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormDescriptor {
    pub id: FormId,

    /// Card title, also used in the modal header.
    pub title: String,

    /// Guide image for the modal, resolved against the asset directory.
    pub image: PathBuf,
}

impl FormDescriptor {
    /// Header text of the guide modal for this form.
    pub fn modal_title(&self) -> String {
        format!("{} 작성 안내", self.title)
    }
}

/// Built-in forms: (id, title, image file name).
const BUILTIN_FORMS: [(&str, &str, &str); 6] = [
    ("birth", "출생신고서", "birth-guide.jpg"),
    ("death", "사망신고서", "death-guide.jpg"),
    ("marriage", "혼인신고서", "marriage-guide.jpg"),
    ("divorce", "이혼신고서", "divorce-guide.jpg"),
    ("namechange", "개명신고서", "namechange-guide.jpg"),
    ("certificate", "증명신청서", "certificate-guide.jpg"),
];

/// Fixed list of forms offered by the kiosk.
///
/// Built once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct FormCatalog {
    forms: Vec<FormDescriptor>,
}

impl FormCatalog {
    /// Build the built-in catalog with images under `asset_dir`.
    pub fn builtin(asset_dir: &Path) -> Self {
        let forms = BUILTIN_FORMS
            .iter()
            .map(|(id, title, image)| FormDescriptor {
                id: FormId::new(*id),
                title: (*title).to_string(),
                image: asset_dir.join(image),
            })
            .collect();

        Self { forms }
    }

    /// Look up a form by id.
    pub fn get(&self, id: &FormId) -> Option<&FormDescriptor> {
        self.forms.iter().find(|f| &f.id == id)
    }

    /// Iterate over the forms in card order.
    pub fn iter(&self) -> impl Iterator<Item = &FormDescriptor> {
        self.forms.iter()
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_has_six_forms() {
        let catalog = FormCatalog::builtin(Path::new("assets"));
        assert_eq!(catalog.len(), 6);

        let ids: Vec<&str> = catalog.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(
            ids,
            ["birth", "death", "marriage", "divorce", "namechange", "certificate"]
        );
    }

    #[test]
    fn test_catalog_lookup() {
        let catalog = FormCatalog::builtin(Path::new("/srv/kiosk"));

        let marriage = catalog.get(&FormId::from("marriage")).unwrap();
        assert_eq!(marriage.title, "혼인신고서");
        assert_eq!(
            marriage.image,
            PathBuf::from("/srv/kiosk/marriage-guide.jpg")
        );

        assert!(catalog.get(&FormId::from("passport")).is_none());
    }

    #[test]
    fn test_modal_title() {
        let catalog = FormCatalog::builtin(Path::new("assets"));
        let birth = catalog.get(&FormId::from("birth")).unwrap();
        assert_eq!(birth.modal_title(), "출생신고서 작성 안내");
    }

    #[test]
    fn test_activity_kind_parse() {
        assert_eq!(ActivityKind::parse("touchstart"), Some(ActivityKind::TouchStart));
        assert_eq!(ActivityKind::parse("MouseMove"), Some(ActivityKind::MouseMove));
        assert_eq!(ActivityKind::parse(" keypress "), Some(ActivityKind::KeyPress));
        assert_eq!(ActivityKind::parse("scroll"), None);
    }

    #[test]
    fn test_activity_kind_serde_names_match_protocol() {
        for kind in ActivityKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }
}
