use std::collections::HashMap;

use crate::gpu::{GpuError, GraphicsBackend, Handle, UniformLocation};

use super::{ShaderError, UniformValue};

#[derive(Debug, Clone)]
struct Field {
    name: String,
    value: UniformValue,
}

/// Location cache and dirty flags of one attached program, indexed like `fields`.
#[derive(Debug, Clone)]
struct ProgramBinding {
    locations: Vec<Option<UniformLocation>>,
    dirty: Vec<bool>,
}

impl ProgramBinding {
    fn mark_all(&mut self) {
        self.dirty.iter_mut().for_each(|d| *d = true);
    }
}

/// Named shader parameters with per-program dirty tracking.
///
/// Setters record the new value and flag it for every attached program; the
/// backend is only touched by [`UniformBlock::update_parameters`], which pushes
/// the flagged values for one program and clears its flags.
#[derive(Debug, Clone, Default)]
pub struct UniformBlock {
    fields: Vec<Field>,
    programs: HashMap<Handle, ProgramBinding>,
}

impl UniformBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a parameter with its initial value.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<UniformValue>) -> Self {
        self.declare(name, value);
        self
    }

    /// Declares a parameter; an existing name is overwritten through [`UniformBlock::set`].
    pub fn declare(&mut self, name: impl Into<String>, value: impl Into<UniformValue>) {
        let name = name.into();
        let value = value.into();
        if self.index_of(&name).is_some() {
            let _ = self.set(&name, value);
            return;
        }
        self.fields.push(Field { name, value });
        // Programs attached earlier have not resolved this name yet.
        for binding in self.programs.values_mut() {
            binding.locations.push(None);
            binding.dirty.push(true);
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&UniformValue> {
        self.index_of(name).map(|i| &self.fields[i].value)
    }

    /// Stores `value` under `name`.
    ///
    /// Returns whether the value changed; an unchanged value dirties nothing.
    pub fn set(&mut self, name: &str, value: impl Into<UniformValue>) -> Result<bool, ShaderError> {
        let value = value.into();
        let index = self
            .index_of(name)
            .ok_or_else(|| ShaderError::UnknownParameter(name.to_owned()))?;

        let field = &mut self.fields[index];
        if field.value == value {
            return Ok(false);
        }
        if field.value.kind() != value.kind() {
            log::warn!(
                "uniform '{name}' changes kind from {:?} to {:?}",
                field.value.kind(),
                value.kind()
            );
        }
        field.value = value;
        for binding in self.programs.values_mut() {
            binding.dirty[index] = true;
        }
        Ok(true)
    }

    /// Resolves every parameter's location in `program` and flags all of them.
    ///
    /// Names the program does not declare cache as `None` and are never pushed.
    /// Re-attaching refreshes the cache.
    pub fn attach(&mut self, backend: &mut dyn GraphicsBackend, program: Handle) {
        let locations: Vec<_> = self
            .fields
            .iter()
            .map(|f| {
                let loc = backend.uniform_location(program, &f.name);
                if loc.is_none() {
                    log::debug!("program {program} has no uniform '{}'", f.name);
                }
                loc
            })
            .collect();
        let dirty = vec![true; locations.len()];
        self.programs.insert(program, ProgramBinding { locations, dirty });
    }

    pub fn detach(&mut self, program: Handle) -> bool {
        self.programs.remove(&program).is_some()
    }

    pub fn is_attached(&self, program: Handle) -> bool {
        self.programs.contains_key(&program)
    }

    /// Flags every parameter for `program`, forcing a full push next update.
    pub fn invalidate(&mut self, program: Handle) {
        if let Some(binding) = self.programs.get_mut(&program) {
            binding.mark_all();
        }
    }

    /// Pushes the parameters flagged for `program` and clears their flags.
    ///
    /// Returns the number of `set_uniform` calls issued. On a backend failure
    /// the fields not yet pushed stay flagged.
    pub fn update_parameters(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        program: Handle,
    ) -> Result<usize, ShaderError> {
        let binding = self
            .programs
            .get_mut(&program)
            .ok_or(ShaderError::NotAttached { program })?;

        let mut pushed = 0;
        for (i, field) in self.fields.iter().enumerate() {
            if !binding.dirty[i] {
                continue;
            }
            if let Some(location) = binding.locations[i] {
                backend
                    .set_uniform(program, location, &field.value)
                    .map_err(GpuError::from)?;
                pushed += 1;
            }
            binding.dirty[i] = false;
        }
        if pushed > 0 {
            log::trace!("pushed {pushed} uniform(s) to program {program}");
        }
        Ok(pushed)
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}
