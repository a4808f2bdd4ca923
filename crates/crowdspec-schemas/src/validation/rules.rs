//! Cross-field rule engine
//!
//! A [`RuleEngine`] runs a fixed, declared sequence of named rules over a
//! record that already passed the shape layer. A rule either passes, fails,
//! or hands back a replacement record carrying injected defaults; the engine
//! never mutates a record in place.
//!
//! `request_type` is always resolved by the first rule. Any later rule that
//! needs it and finds it absent fails with [`ErrorKind::MissingDiscriminant`],
//! which stops the engine in every failure mode.
//!
//! Copyright (c) 2025 Crowdspec Team
//! Licensed under the Apache-2.0 license

use crate::models::{
    AnswerSet, Manifest, NestedManifest, Presence, QuestionExample, RequestConfig, RequestType,
};
use crate::validation::{ErrorKind, ValidationContext, ValidationError, ValidationErrors};
use tracing::{debug, trace};
use url::Url;

/// What a passing rule hands back
#[derive(Debug)]
pub enum Outcome<R> {
    /// Record unchanged
    Pass,
    /// Continue with this record instead
    Replace(R),
}

/// Signature of a rule body
pub type RuleFn<R> = fn(&R, &ValidationContext) -> Result<Outcome<R>, ValidationErrors>;

/// A named cross-field rule
pub struct Rule<R> {
    name: &'static str,
    apply: RuleFn<R>,
}

impl<R> Rule<R> {
    pub const fn new(name: &'static str, apply: RuleFn<R>) -> Self {
        Self { name, apply }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Ordered rule list for one record type
pub struct RuleEngine<R> {
    rules: Vec<Rule<R>>,
}

impl<R> RuleEngine<R> {
    pub fn new(rules: Vec<Rule<R>>) -> Self {
        Self { rules }
    }

    /// Rule names in execution order
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(Rule::name).collect()
    }

    /// Run every rule in order, returning the final record
    ///
    /// In fail-fast mode the first failing rule ends the run. Otherwise
    /// failures are collected up to `max_errors`, and later rules see the
    /// record as it was before the failing rule.
    pub fn run(&self, record: R, context: &ValidationContext) -> Result<R, ValidationErrors> {
        let mut record = record;
        let mut errors = ValidationErrors::new();

        for rule in &self.rules {
            trace!(rule = rule.name, path = %context.path, "applying rule");
            match (rule.apply)(&record, context) {
                Ok(Outcome::Pass) => {}
                Ok(Outcome::Replace(next)) => {
                    debug!(rule = rule.name, path = %context.path, "rule replaced record");
                    record = next;
                }
                Err(failures) => {
                    let missing_discriminant =
                        failures.iter().any(|e| e.kind == ErrorKind::MissingDiscriminant);
                    errors.extend(failures);
                    if missing_discriminant || context.config.limit_reached(errors.len()) {
                        break;
                    }
                }
            }
        }

        if context.config.max_errors > 0 {
            errors.errors.truncate(context.config.max_errors);
        }
        errors.into_result().map(|_| record)
    }
}

/// Fields shared by Manifest and NestedManifest that the common rules read
pub trait ChallengeFields: Clone {
    fn request_type(&self) -> Option<RequestType>;
    fn request_config(&self) -> Option<&RequestConfig>;
    fn answer_set(&self) -> Option<&AnswerSet>;
    fn with_answer_set(self, answer_set: AnswerSet) -> Self;
    fn question_example(&self) -> Option<&QuestionExample>;
    fn groundtruth(&self) -> Presence<&String>;
    fn groundtruth_uri(&self) -> Presence<&Url>;
}

fn fail(rule: &'static str, context: &ValidationContext, field: &str, message: impl Into<String>) -> ValidationErrors {
    ValidationError::rule(rule, context.path.child(field), message).into()
}

fn resolved_request_type<R: ChallengeFields>(
    record: &R,
    rule: &'static str,
    context: &ValidationContext,
) -> Result<RequestType, ValidationErrors> {
    record
        .request_type()
        .ok_or_else(|| ValidationError::missing_discriminant(rule, context.path.child("request_type")).into())
}

fn check_choice_bounds<R: ChallengeFields>(
    record: &R,
    request_type: RequestType,
    context: &ValidationContext,
) -> Result<(), ValidationErrors> {
    if !request_type.has_choice_bounds() {
        return Ok(());
    }
    let defaults = RequestConfig::default();
    let config = record.request_config().unwrap_or(&defaults);
    if config.multiple_choice_min_choices > config.multiple_choice_max_choices {
        return Err(ValidationError::rule(
            "request_type",
            context.path.child("request_config").child("multiple_choice_min_choices"),
            "multiple_choice_min_choices cannot be greater than multiple_choice_max_choices",
        )
        .into());
    }
    Ok(())
}

/// Manifest rule 1: discriminant, multi_challenge list, choice bounds
pub fn manifest_request_type(manifest: &Manifest, context: &ValidationContext) -> Result<Outcome<Manifest>, ValidationErrors> {
    let request_type = resolved_request_type(manifest, "request_type", context)?;
    if request_type == RequestType::MultiChallenge {
        let has_nested = manifest
            .multi_challenge_manifests
            .as_ref()
            .is_some_and(|nested| !nested.is_empty());
        if !has_nested {
            return Err(fail(
                "request_type",
                context,
                "multi_challenge_manifests",
                "multi_challenge requires multi_challenge_manifests.",
            ));
        }
        return Ok(Outcome::Pass);
    }
    check_choice_bounds(manifest, request_type, context)?;
    Ok(Outcome::Pass)
}

/// NestedManifest rule 1: nesting is not recursive
pub fn nested_request_type(
    nested: &NestedManifest,
    context: &ValidationContext,
) -> Result<Outcome<NestedManifest>, ValidationErrors> {
    let request_type = resolved_request_type(nested, "request_type", context)?;
    if request_type == RequestType::MultiChallenge {
        return Err(fail(
            "request_type",
            context,
            "request_type",
            "multi_challenge request is not allowed here.",
        ));
    }
    check_choice_bounds(nested, request_type, context)?;
    Ok(Outcome::Pass)
}

/// Run the nested rule list over every sub-job
pub fn multi_challenge_manifests(
    manifest: &Manifest,
    context: &ValidationContext,
) -> Result<Outcome<Manifest>, ValidationErrors> {
    let Some(nested) = manifest.multi_challenge_manifests.as_ref() else {
        return Ok(Outcome::Pass);
    };

    let engine = nested_manifest_rules();
    let list_context = context.child("multi_challenge_manifests");
    let mut validated = Vec::with_capacity(nested.len());
    let mut errors = ValidationErrors::new();

    for (i, entry) in nested.iter().enumerate() {
        match engine.run(entry.clone(), &list_context.child_index(i)) {
            Ok(entry) => validated.push(entry),
            Err(failures) => {
                errors.extend(failures);
                if context.config.limit_reached(errors.len()) {
                    break;
                }
            }
        }
    }

    errors.into_result()?;
    if &validated == nested {
        return Ok(Outcome::Pass);
    }
    Ok(Outcome::Replace(Manifest {
        multi_challenge_manifests: Some(validated),
        ..manifest.clone()
    }))
}

/// Rule 2: default or bound the restricted answer set
pub fn requester_restricted_answer_set<R: ChallengeFields>(
    record: &R,
    context: &ValidationContext,
) -> Result<Outcome<R>, ValidationErrors> {
    const RULE: &str = "requester_restricted_answer_set";
    let request_type = resolved_request_type(record, RULE, context)?;
    let size = record.answer_set().map_or(0, |set| set.len());

    match request_type {
        RequestType::ImageLabelAreaSelect if size == 0 => {
            debug!(path = %context.path, "injecting default answer set for area select");
            let mut answer_set = AnswerSet::new();
            answer_set.insert("label".to_string(), Default::default());
            Ok(Outcome::Replace(record.clone().with_answer_set(answer_set)))
        }
        RequestType::ImageLabelMultipleChoice if size < 2 => Err(fail(
            RULE,
            context,
            RULE,
            "image_label_multiple_choice needs at least 2+ options in requester_restricted_answer_set",
        )),
        RequestType::ImageLabelMultipleChoice if size > 4 => Err(fail(
            RULE,
            context,
            RULE,
            "image_label_multiple_choice can not handle more than 4 options requester_restricted_answer_set",
        )),
        _ => Ok(Outcome::Pass),
    }
}

/// Rule 3: list-valued examples only for select job types
pub fn requester_question_example<R: ChallengeFields>(
    record: &R,
    context: &ValidationContext,
) -> Result<Outcome<R>, ValidationErrors> {
    const RULE: &str = "requester_question_example";
    let request_type = resolved_request_type(record, RULE, context)?;
    let is_list = record.question_example().is_some_and(QuestionExample::is_list);
    if is_list && !request_type.allows_example_list() {
        return Err(fail(RULE, context, RULE, "Lists are not allowed in this challenge type"));
    }
    Ok(Outcome::Pass)
}

/// Rule 4: groundtruth and groundtruth_uri are exclusive
pub fn groundtruth_exclusivity<R: ChallengeFields>(
    record: &R,
    context: &ValidationContext,
) -> Result<Outcome<R>, ValidationErrors> {
    let (inline, remote) = (record.groundtruth(), record.groundtruth_uri());
    let both = if context.config.key_presence_exclusivity {
        inline.is_present() && remote.is_present()
    } else {
        inline.is_set() && remote.is_set()
    };
    if both {
        return Err(fail(
            "groundtruth_exclusivity",
            context,
            "groundtruth",
            "Specify only groundtruth_uri or groundtruth, not both.",
        ));
    }
    Ok(Outcome::Pass)
}

/// Rule 5: exactly one of inline taskdata and taskdata_uri
pub fn taskdata_exclusivity(manifest: &Manifest, context: &ValidationContext) -> Result<Outcome<Manifest>, ValidationErrors> {
    const RULE: &str = "taskdata_exclusivity";
    let inline = manifest.taskdata.as_ref().is_some_and(|entries| !entries.is_empty());
    let remote = manifest.taskdata_uri.is_some();
    match (inline, remote) {
        (true, true) => Err(fail(RULE, context, "taskdata", "Specify only one of taskdata or taskdata_uri")),
        (false, false) => Err(fail(RULE, context, "taskdata", "No taskdata or taskdata_uri found in manifest")),
        _ => Ok(Outcome::Pass),
    }
}

/// Floor applied to requester_min_repeats for multiple choice jobs
pub const MULTIPLE_CHOICE_MIN_REPEATS: u64 = 4;

/// Rule 6: silently raise requester_min_repeats for multiple choice
pub fn min_repeats_floor(manifest: &Manifest, context: &ValidationContext) -> Result<Outcome<Manifest>, ValidationErrors> {
    let request_type = resolved_request_type(manifest, "min_repeats_floor", context)?;
    if request_type != RequestType::ImageLabelMultipleChoice
        || manifest.requester_min_repeats >= MULTIPLE_CHOICE_MIN_REPEATS
    {
        return Ok(Outcome::Pass);
    }
    debug!(
        path = %context.path,
        from = manifest.requester_min_repeats,
        to = MULTIPLE_CHOICE_MIN_REPEATS,
        "raising requester_min_repeats"
    );
    Ok(Outcome::Replace(Manifest {
        requester_min_repeats: MULTIPLE_CHOICE_MIN_REPEATS,
        ..manifest.clone()
    }))
}

/// Rule 7: both dates or neither, ordered, at most seven days apart
pub fn scheduling_window(manifest: &Manifest, context: &ValidationContext) -> Result<Outcome<Manifest>, ValidationErrors> {
    const RULE: &str = "scheduling_window";
    // 0 means unset
    let start = manifest.start_date.filter(|date| *date != 0);
    let expiration = manifest.expiration_date.filter(|date| *date != 0);

    match (start, expiration) {
        (None, None) => Ok(Outcome::Pass),
        (Some(_), None) => Err(fail(RULE, context, "expiration_date", "You must specify both start_date and expiration_date")),
        (None, Some(_)) => Err(fail(RULE, context, "start_date", "You must specify both start_date and expiration_date")),
        (Some(start), Some(expiration)) => {
            if start >= expiration {
                return Err(fail(RULE, context, "start_date", "start_date must be before expiration_date"));
            }
            // An overflowing span is longer than any allowed window
            let too_long = expiration
                .checked_sub(start)
                .map_or(true, |span| span > Manifest::max_job_duration().num_seconds());
            if too_long {
                return Err(fail(RULE, context, "expiration_date", "Max job duration is 7 days."));
            }
            Ok(Outcome::Pass)
        }
    }
}

/// The Manifest rule sequence
pub fn manifest_rules() -> RuleEngine<Manifest> {
    RuleEngine::new(vec![
        Rule::new("request_type", manifest_request_type),
        Rule::new("multi_challenge_manifests", multi_challenge_manifests),
        Rule::new("requester_restricted_answer_set", requester_restricted_answer_set::<Manifest>),
        Rule::new("requester_question_example", requester_question_example::<Manifest>),
        Rule::new("groundtruth_exclusivity", groundtruth_exclusivity::<Manifest>),
        Rule::new("taskdata_exclusivity", taskdata_exclusivity),
        Rule::new("min_repeats_floor", min_repeats_floor),
        Rule::new("scheduling_window", scheduling_window),
    ])
}

/// The NestedManifest rule sequence
pub fn nested_manifest_rules() -> RuleEngine<NestedManifest> {
    RuleEngine::new(vec![
        Rule::new("request_type", nested_request_type),
        Rule::new("requester_restricted_answer_set", requester_restricted_answer_set::<NestedManifest>),
        Rule::new("requester_question_example", requester_question_example::<NestedManifest>),
        Rule::new("groundtruth_exclusivity", groundtruth_exclusivity::<NestedManifest>),
    ])
}
