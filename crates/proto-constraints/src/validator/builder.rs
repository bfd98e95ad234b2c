use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use prost_reflect::{FieldDescriptor, MessageDescriptor};

use crate::boundary::{Boundary, NumberBoundaries};
use crate::constraint::{
    AllRequired, CompositeConstraint, Constraint, CustomOption, FieldConstraint,
    MessageConstraints, Pattern, Required, RequiredFieldConstraint,
};
use crate::error::CompilationError;
use crate::field::FieldDeclaration;
use crate::rules::{FieldRules, Rules};

/// Build-through cache of constraint sets keyed by message full name.
pub(crate) struct Builder {
    /// Serializes cache writes.
    build_lock: Mutex<()>,
    /// Constraint set cache.
    cache: RwLock<HashMap<String, Arc<MessageConstraints>>>,
    /// Whether unknown types can be lazily built.
    lazy: bool,
    /// Option values and custom rules.
    rules: Rules,
}

impl Builder {
    fn read_cache(
        &self,
    ) -> std::sync::RwLockReadGuard<'_, HashMap<String, Arc<MessageConstraints>>> {
        self.cache
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write_cache(
        &self,
    ) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Arc<MessageConstraints>>> {
        self.cache
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn lock_build(&self) -> std::sync::MutexGuard<'_, ()> {
        self.build_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    pub fn new(rules: Rules, lazy: bool) -> Self {
        Self {
            build_lock: Mutex::new(()),
            cache: RwLock::new(HashMap::new()),
            lazy,
            rules,
        }
    }

    /// Load a cached constraint set or build a new one.
    pub fn load_or_build(&self, desc: &MessageDescriptor) -> Arc<MessageConstraints> {
        let key = desc.full_name().to_string();

        // Fast path
        {
            let cache = self.read_cache();
            if let Some(constraints) = cache.get(&key) {
                return Arc::clone(constraints);
            }
        }

        if !self.lazy {
            let constraints = MessageConstraints::placeholder(key.as_str());
            constraints.fill(Err(CompilationError::new(format!(
                "no constraints available for {key}"
            ))));
            return Arc::new(constraints);
        }

        // Slow path
        let _guard = self.lock_build();

        {
            let cache = self.read_cache();
            if let Some(constraints) = cache.get(&key) {
                return Arc::clone(constraints);
            }
        }

        let mut local_cache = self.read_cache().clone();
        let constraints = self.build(desc, &mut local_cache);
        *self.write_cache() = local_cache;

        constraints
    }

    /// Preload a constraint set into the cache, even when lazy building is
    /// disabled.
    pub fn preload(&self, desc: &MessageDescriptor) {
        let key = desc.full_name().to_string();
        if self.read_cache().contains_key(&key) {
            return;
        }

        let _guard = self.lock_build();
        if self.read_cache().contains_key(&key) {
            return;
        }

        let mut local_cache = self.read_cache().clone();
        let _ = self.build(desc, &mut local_cache);
        *self.write_cache() = local_cache;
    }

    /// Build the constraint set of a message descriptor.
    /// Recursive types are handled by inserting a placeholder before recursing.
    fn build(
        &self,
        desc: &MessageDescriptor,
        cache: &mut HashMap<String, Arc<MessageConstraints>>,
    ) -> Arc<MessageConstraints> {
        let key = desc.full_name().to_string();

        if let Some(constraints) = cache.get(&key) {
            return Arc::clone(constraints);
        }

        let constraints = Arc::new(MessageConstraints::placeholder(key.as_str()));
        cache.insert(key, Arc::clone(&constraints));
        let result = self.build_message(desc, cache);
        match &result {
            Ok(built) => tracing::debug!(
                message_type = desc.full_name(),
                constraints = built.len(),
                "built message constraints"
            ),
            Err(err) => tracing::debug!(
                message_type = desc.full_name(),
                error = %err,
                "failed to build message constraints"
            ),
        }
        constraints.fill(result);
        constraints
    }

    fn build_message(
        &self,
        desc: &MessageDescriptor,
        cache: &mut HashMap<String, Arc<MessageConstraints>>,
    ) -> Result<Vec<Constraint>, CompilationError> {
        let mut constraints = Vec::new();
        for field in desc.fields() {
            let Some(rules) = self.rules.field_rules(&field) else {
                continue;
            };
            self.build_field(&field, rules, cache, &mut constraints)
                .map_err(|err| {
                    CompilationError::new(format!("{}: {}", field.full_name(), err.cause))
                })?;
        }

        if let Some(expression) = self
            .rules
            .message_rules(desc)
            .and_then(|rules| rules.required_field.as_deref())
        {
            constraints.push(Constraint::RequiredField(RequiredFieldConstraint::parse(
                desc, expression,
            )?));
        }
        Ok(constraints)
    }

    fn build_field(
        &self,
        field: &FieldDescriptor,
        rules: &FieldRules,
        cache: &mut HashMap<String, Arc<MessageConstraints>>,
        out: &mut Vec<Constraint>,
    ) -> Result<(), CompilationError> {
        let decl = FieldDeclaration::new(field.clone());

        if rules.required {
            if Required::applies_to(&decl) {
                let mut constraint = FieldConstraint::new(decl.clone(), Required);
                if let Some(msg) = &rules.if_missing {
                    constraint = constraint.with_error_msg(msg.as_str());
                }
                out.push(Constraint::Required(constraint));
            } else {
                tracing::warn!(
                    field = field.full_name(),
                    "`required` has no effect on numeric or bool fields; ignoring"
                );
            }
        }

        if let Some(constraint) = build_range(&decl, rules)? {
            out.push(Constraint::Range(constraint));
        }

        if let Some(pattern) = &rules.pattern {
            if !decl.is_string() {
                return Err(CompilationError::new("`pattern` applies to string fields only"));
            }
            let mut constraint = FieldConstraint::new(decl.clone(), Pattern::new(&pattern.regex)?);
            if let Some(msg) = &pattern.error_msg {
                constraint = constraint.with_error_msg(msg.as_str());
            }
            out.push(Constraint::Pattern(constraint));
        }

        if rules.all_required {
            if decl.is_collection() {
                out.push(Constraint::AllRequired(FieldConstraint::new(
                    decl.clone(),
                    AllRequired,
                )));
            } else {
                tracing::warn!(
                    field = field.full_name(),
                    "`all_required` has no effect on singular fields; ignoring"
                );
            }
        }

        for (name, value) in &rules.custom {
            let rule = self.rules.custom(name).ok_or_else(|| {
                CompilationError::new(format!("unknown custom option `{name}`"))
            })?;
            out.push(Constraint::Custom(FieldConstraint::new(
                decl.clone(),
                CustomOption::new(Arc::clone(rule), value.clone()),
            )));
        }

        if rules.validate {
            let Some(nested) = decl.element_kind().as_message().cloned() else {
                return Err(CompilationError::new(
                    "`validate` applies to message fields only",
                ));
            };
            let nested = self.build(&nested, cache);
            out.push(Constraint::Composite(CompositeConstraint::new(decl, nested)));
        }

        Ok(())
    }
}

fn build_range(
    decl: &FieldDeclaration,
    rules: &FieldRules,
) -> Result<Option<FieldConstraint<NumberBoundaries>>, CompilationError> {
    let has_bounds = rules.min.is_some() || rules.max.is_some();
    if rules.range.is_none() && !has_bounds {
        return Ok(None);
    }
    if !decl.is_numeric() {
        return Err(CompilationError::new(
            "`min`, `max` and `range` apply to numeric fields only",
        ));
    }

    let bounds = match &rules.range {
        Some(_) if has_bounds => {
            return Err(CompilationError::new(
                "`range` cannot be combined with `min` or `max`",
            ));
        }
        Some(range) => NumberBoundaries::parse_range(range)?,
        None => {
            let min = rules
                .min
                .as_ref()
                .map(|b| Boundary::parse(&b.value, !b.exclusive))
                .transpose()?;
            let max = rules
                .max
                .as_ref()
                .map(|b| Boundary::parse(&b.value, !b.exclusive))
                .transpose()?;
            NumberBoundaries::new(min, max)?
        }
    };

    let mut constraint = FieldConstraint::new(decl.clone(), bounds);
    let error_msg = rules
        .min
        .as_ref()
        .and_then(|b| b.error_msg.as_deref())
        .or_else(|| rules.max.as_ref().and_then(|b| b.error_msg.as_deref()));
    if let Some(msg) = error_msg {
        constraint = constraint.with_error_msg(msg);
    }
    Ok(Some(constraint))
}
