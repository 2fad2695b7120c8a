use serde::Serialize;

use crate::form::{FormField, EVENT_FORM_CALLBACK_ID};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextObject {
    PlainText { text: String },
}

impl TextObject {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::PlainText { text: text.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputElement {
    PlainTextInput { action_id: String, placeholder: TextObject },
    Datepicker { action_id: String, placeholder: TextObject },
    Timepicker { action_id: String, placeholder: TextObject },
}

impl InputElement {
    pub fn plain_text(action_id: impl Into<String>, placeholder: impl Into<String>) -> Self {
        Self::PlainTextInput {
            action_id: action_id.into(),
            placeholder: TextObject::plain(placeholder),
        }
    }

    pub fn datepicker(action_id: impl Into<String>, placeholder: impl Into<String>) -> Self {
        Self::Datepicker {
            action_id: action_id.into(),
            placeholder: TextObject::plain(placeholder),
        }
    }

    pub fn timepicker(action_id: impl Into<String>, placeholder: impl Into<String>) -> Self {
        Self::Timepicker {
            action_id: action_id.into(),
            placeholder: TextObject::plain(placeholder),
        }
    }

    pub fn action_id(&self) -> &str {
        match self {
            Self::PlainTextInput { action_id, .. }
            | Self::Datepicker { action_id, .. }
            | Self::Timepicker { action_id, .. } => action_id,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Input { block_id: String, element: InputElement, label: TextObject },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ModalView {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub callback_id: String,
    pub title: TextObject,
    pub blocks: Vec<Block>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submit: Option<TextObject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_metadata: Option<String>,
}

pub struct ModalBuilder {
    callback_id: String,
    title: String,
    blocks: Vec<Block>,
    submit: Option<String>,
    private_metadata: Option<String>,
}

impl ModalBuilder {
    pub fn new(callback_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            callback_id: callback_id.into(),
            title: title.into(),
            blocks: Vec::new(),
            submit: None,
            private_metadata: None,
        }
    }

    pub fn input(
        mut self,
        block_id: impl Into<String>,
        label: impl Into<String>,
        element: InputElement,
    ) -> Self {
        self.blocks.push(Block::Input {
            block_id: block_id.into(),
            element,
            label: TextObject::plain(label),
        });
        self
    }

    pub fn submit(mut self, label: impl Into<String>) -> Self {
        self.submit = Some(label.into());
        self
    }

    /// Opaque string Slack hands back unchanged on submission.
    pub fn private_metadata(mut self, metadata: impl Into<String>) -> Self {
        self.private_metadata = Some(metadata.into());
        self
    }

    pub fn build(self) -> ModalView {
        ModalView {
            kind: "modal",
            callback_id: self.callback_id,
            title: TextObject::plain(self.title),
            blocks: self.blocks,
            submit: self.submit.map(TextObject::plain),
            private_metadata: self.private_metadata,
        }
    }
}

/// The "Create Event" form; `channel_id` rides along as private metadata.
pub fn event_creation_modal(channel_id: &str) -> ModalView {
    FormField::ALL
        .into_iter()
        .fold(ModalBuilder::new(EVENT_FORM_CALLBACK_ID, "Create Event"), |modal, field| {
            let element = match field {
                FormField::Date => InputElement::datepicker(field.action_id(), field.placeholder()),
                FormField::Time => InputElement::timepicker(field.action_id(), field.placeholder()),
                FormField::Title | FormField::Location | FormField::Timezone => {
                    InputElement::plain_text(field.action_id(), field.placeholder())
                }
            };
            modal.input(field.block_id(), field.label(), element)
        })
        .submit("Create")
        .private_metadata(channel_id)
        .build()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{event_creation_modal, Block, InputElement, ModalBuilder};
    use crate::form::FormField;

    #[test]
    fn event_modal_serializes_to_block_kit_shape() {
        let modal = event_creation_modal("C123");
        let value = serde_json::to_value(&modal).expect("serialize modal");

        assert_eq!(value["type"], "modal");
        assert_eq!(value["callback_id"], "event_creation");
        assert_eq!(value["title"], json!({"type": "plain_text", "text": "Create Event"}));
        assert_eq!(value["submit"], json!({"type": "plain_text", "text": "Create"}));
        assert_eq!(value["private_metadata"], "C123");
        assert_eq!(
            value["blocks"][2],
            json!({
                "type": "input",
                "block_id": "datetime_block",
                "element": {
                    "type": "datepicker",
                    "action_id": "date",
                    "placeholder": {"type": "plain_text", "text": "Select a date"}
                },
                "label": {"type": "plain_text", "text": "Date"}
            })
        );
        assert_eq!(value["blocks"][3]["element"]["type"], "timepicker");
        assert_eq!(value["blocks"][4]["element"]["type"], "plain_text_input");
        assert_eq!(
            value["blocks"][4]["element"]["placeholder"]["text"],
            "e.g., America/New_York"
        );
    }

    #[test]
    fn event_modal_uses_the_fixed_field_identifiers_in_order() {
        let modal = event_creation_modal("C1");
        let identifiers = modal
            .blocks
            .iter()
            .map(|block| match block {
                Block::Input { block_id, element, .. } => {
                    (block_id.as_str(), element.action_id().to_owned())
                }
            })
            .collect::<Vec<_>>();
        let expected = FormField::ALL
            .into_iter()
            .map(|field| (field.block_id(), field.action_id().to_owned()))
            .collect::<Vec<_>>();

        assert_eq!(identifiers, expected);
    }

    #[test]
    fn builder_omits_unset_optional_fields() {
        let modal = ModalBuilder::new("cb", "Title")
            .input("b1", "Label", InputElement::plain_text("a1", "hint"))
            .build();
        let value = serde_json::to_value(&modal).expect("serialize modal");

        assert!(value.get("submit").is_none());
        assert!(value.get("private_metadata").is_none());
        assert_eq!(value["blocks"][0]["element"]["type"], "plain_text_input");
    }
}
