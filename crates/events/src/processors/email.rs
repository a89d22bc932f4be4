//! Email behaviors.
//!
//! Header fields are filled from the trigger scope with `%%code%%`
//! replacement and the message body is rendered as a `minijinja` template
//! with its codes bound as values. The result is handed to the
//! [`Mailer`](crate::collaborators::Mailer) when every required field
//! survived substitution.

use behavior_core::behavior::BehaviorRef;
use behavior_core::behavior_type::BehaviorKind;
use behavior_core::context::TriggerContext;
use behavior_core::template::parse_list;
use behavior_core::types::DbId;
use serde_json::{Map, Value};

use crate::delivery::email::{parse_recipients, OutgoingEmail};
use crate::error::BehaviorResult;
use crate::processors::{Outcome, SkipReason};
use crate::store::BehaviorStore;

#[derive(Clone)]
pub struct EmailProcessor {
    store: BehaviorStore,
}

impl EmailProcessor {
    pub fn new(store: BehaviorStore) -> Self {
        Self { store }
    }

    /// Build and send the email of one behavior.
    ///
    /// Only the behavior's stored status is checked here; overrides are
    /// applied when behaviors are selected for an event.
    pub async fn process(
        &self,
        behavior: &BehaviorRef,
        context: &TriggerContext,
        vars: &Map<String, Value>,
    ) -> BehaviorResult<Outcome> {
        context.validate()?;
        let mut behavior = self.store.require_behavior(behavior).await?;
        if !behavior.is_active() {
            return Ok(skip(behavior.id, SkipReason::NotActive));
        }

        let kind = BehaviorKind::from_name(&behavior.behavior_type);
        if kind != BehaviorKind::Email {
            return Ok(skip(behavior.id, SkipReason::UnsupportedType(kind.to_string())));
        }

        let collab = self.store.collaborators();
        let user = collab.resolve_user(context).await?;
        let scope = context.with_resolved_user(user).template_scope(vars);
        for field in behavior.template_fields_mut() {
            *field = collab.templates.substitute(field, &scope);
        }
        let message = collab.templates.evaluate(&behavior.message, &scope)?;
        let substitute_list = |raw: &Option<String>| -> Vec<String> {
            raw.as_deref()
                .map(parse_list)
                .unwrap_or_default()
                .iter()
                .map(|entry| collab.templates.substitute(entry, &scope))
                .collect()
        };
        let headers = substitute_list(&behavior.headers);
        let attachments = substitute_list(&behavior.attachments);

        for (name, value) in [
            ("from_addr", &behavior.from_addr),
            ("recipients", &behavior.recipients),
            ("subject", &behavior.subject),
            ("message", &message),
        ] {
            if value.trim().is_empty() {
                return Ok(skip(behavior.id, SkipReason::EmptyField(name)));
            }
        }

        let recipients = parse_recipients(&behavior.recipients);
        if recipients.is_empty() {
            return Ok(skip(behavior.id, SkipReason::NoRecipients));
        }
        if !collab.mailer.is_enabled() {
            return Ok(skip(behavior.id, SkipReason::MailDisabled));
        }

        let email = OutgoingEmail {
            from_name: behavior.from_name,
            from_addr: behavior.from_addr,
            recipients: recipients.iter().map(ToString::to_string).collect(),
            headers,
            subject: behavior.subject,
            message,
            attachments,
        };
        collab.mailer.send(&email).await?;

        tracing::info!(
            behavior_id = behavior.id,
            recipients = email.recipients.len(),
            "Email behavior executed"
        );
        Ok(Outcome::Executed)
    }
}

fn skip(behavior_id: DbId, reason: SkipReason) -> Outcome {
    tracing::debug!(behavior_id, reason = %reason, "Email behavior skipped");
    Outcome::Skipped(reason)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
