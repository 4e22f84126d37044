use std::{
    marker::PhantomData,
    ops::{Deref, DerefMut, Index, IndexMut},
};

use crate::element::{Handle, EH, FH, HH, VH};

/// Values associated with the elements of a mesh, indexed by handle.
///
/// Mesh elements are only ever appended, never removed, so a property stays
/// valid as long as it is grown alongside the mesh with [`Property::resize`].
/// Cloning a property copies its values; two clones never share storage.
#[derive(Clone, Debug, PartialEq)]
pub struct Property<H, T>
where
    H: Handle,
    T: Clone,
{
    buf: Vec<T>,
    default: T,
    _phantom: PhantomData<H>,
}

impl<H, T> Property<H, T>
where
    H: Handle,
    T: Clone,
{
    /// Create a property with `len` copies of `default`.
    pub fn new(len: usize, default: T) -> Self {
        Property {
            buf: vec![default.clone(); len],
            default,
            _phantom: PhantomData,
        }
    }

    /// Grow or shrink to `n` values. New values are filled with the default.
    pub fn resize(&mut self, n: usize) {
        self.buf.resize(n, self.default.clone());
    }

    /// Reset all values to the default.
    pub fn reset(&mut self) {
        let default = self.default.clone();
        self.buf.fill(default);
    }

    pub fn get(&self, h: H) -> Option<&T> {
        self.buf.get(h.index() as usize)
    }

    pub fn get_mut(&mut self, h: H) -> Option<&mut T> {
        self.buf.get_mut(h.index() as usize)
    }

    pub fn set(&mut self, h: H, val: T) {
        self.buf[h.index() as usize] = val;
    }
}

impl<H, T> Index<H> for Property<H, T>
where
    H: Handle,
    T: Clone,
{
    type Output = T;

    fn index(&self, h: H) -> &Self::Output {
        &self.buf[h.index() as usize]
    }
}

impl<H, T> IndexMut<H> for Property<H, T>
where
    H: Handle,
    T: Clone,
{
    fn index_mut(&mut self, h: H) -> &mut Self::Output {
        &mut self.buf[h.index() as usize]
    }
}

impl<H, T> Deref for Property<H, T>
where
    H: Handle,
    T: Clone,
{
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        &self.buf
    }
}

impl<H, T> DerefMut for Property<H, T>
where
    H: Handle,
    T: Clone,
{
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buf
    }
}

/// Property associated with vertices.
pub type VProperty<T> = Property<VH, T>;
/// Property associated with halfedges.
pub type HProperty<T> = Property<HH, T>;
/// Property associated with edges.
pub type EProperty<T> = Property<EH, T>;
/// Property associated with faces.
pub type FProperty<T> = Property<FH, T>;
