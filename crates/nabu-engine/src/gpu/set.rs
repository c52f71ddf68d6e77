use super::{GpuError, GpuResource, GraphicsBackend, Resource};

/// Named, creation-ordered bag of GPU resources owned by one scene.
///
/// `destroy_all` releases every live entry exactly once, newest first, so
/// dependents go before what they depend on.
#[derive(Debug, Default)]
pub struct ResourceSet {
    entries: Vec<(String, Resource)>,
}

impl ResourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `resource` under `name`.
    ///
    /// If the name is taken, the previous resource is handed back still live;
    /// the caller is responsible for destroying it.
    pub fn insert(&mut self, name: impl Into<String>, resource: impl Into<Resource>) -> Option<Resource> {
        let name = name.into();
        let resource = resource.into();
        if let Some(slot) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            return Some(std::mem::replace(&mut slot.1, resource));
        }
        self.entries.push((name, resource));
        None
    }

    pub fn get(&self, name: &str) -> Option<&Resource> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, r)| r)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Resource> {
        self.entries.iter_mut().find(|(n, _)| n == name).map(|(_, r)| r)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Resource)> {
        self.entries.iter().map(|(n, r)| (n.as_str(), r))
    }

    /// Destroys every live resource in reverse creation order and empties the set.
    ///
    /// Keeps going after a failure so nothing leaks; the first error is returned.
    pub fn destroy_all(&mut self, backend: &mut dyn GraphicsBackend) -> Result<(), GpuError> {
        let mut first_err = None;
        while let Some((name, mut resource)) = self.entries.pop() {
            if !resource.is_live() {
                continue;
            }
            if let Err(e) = resource.destroy(backend) {
                log::warn!("failed to destroy '{name}': {e}");
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::RecordingBackend;
    use crate::gpu::{Buffer, BufferKind, Texture};

    #[test]
    fn destroy_all_releases_in_reverse_order() {
        let mut backend = RecordingBackend::new();
        let mut set = ResourceSet::new();

        let a = Buffer::create(&mut backend, BufferKind::Vertex, Some(&[1u8, 2, 3, 4][..])).unwrap();
        let b = Texture::create(&mut backend, None).unwrap();
        let (ha, hb) = (a.handle().unwrap(), b.handle().unwrap());
        set.insert("a", a);
        set.insert("b", b);

        set.destroy_all(&mut backend).unwrap();
        assert!(set.is_empty());
        assert_eq!(backend.destroy_order(), &[hb, ha]);
        assert_eq!(backend.live_handles(), 0);
    }

    #[test]
    fn destroy_all_skips_already_destroyed_entries() {
        let mut backend = RecordingBackend::new();
        let mut set = ResourceSet::new();
        set.insert("a", Buffer::create(&mut backend, BufferKind::Index, None).unwrap());

        if let Some(r) = set.get_mut("a") {
            r.destroy(&mut backend).unwrap();
        }
        set.destroy_all(&mut backend).unwrap();
        assert_eq!(backend.stats().destroys, 1);
        assert!(backend.violations().is_empty());
    }

    #[test]
    fn insert_returns_replaced_resource() {
        let mut backend = RecordingBackend::new();
        let mut set = ResourceSet::new();
        set.insert("t", Texture::create(&mut backend, None).unwrap());
        let old = set.insert("t", Texture::create(&mut backend, None).unwrap());
        assert!(old.is_some_and(|r| r.is_live()));
        assert_eq!(set.len(), 1);
    }
}
