use bytemuck::{Pod, Zeroable};
use glam::{IVec4, Vec4};
use static_assertions::const_assert_eq;
use std::mem;

/// Four floats on a 16-byte boundary, so a slice of them can be fed straight into 128-bit vector loads.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[repr(C, align(16))]
pub struct Float4(pub [f32; 4]);

unsafe impl Zeroable for Float4 {}
unsafe impl Pod for Float4 {}

const_assert_eq!(mem::size_of::<Float4>(), 16);
const_assert_eq!(mem::align_of::<Float4>(), 16);

impl From<Vec4> for Float4 {
    #[inline]
    fn from(v: Vec4) -> Self {
        Self(v.to_array())
    }
}

impl From<Float4> for Vec4 {
    #[inline]
    fn from(v: Float4) -> Self {
        Vec4::from_array(v.0)
    }
}

/// A contiguous, growable array of 16-byte aligned float4 records.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AlignedVec4Array {
    values: Vec<Float4>,
}

impl AlignedVec4Array {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.values.capacity()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn reserve(&mut self, additional: usize) {
        self.values.reserve(additional);
    }

    /// Grows or shrinks to `len` records; new records are filled with `value`.
    pub fn resize(&mut self, len: usize, value: Vec4) {
        self.values.resize(len, value.into());
    }

    pub fn push(&mut self, value: Vec4) {
        self.values.push(value.into());
    }

    pub fn pop(&mut self) -> Option<Vec4> {
        self.values.pop().map(Vec4::from)
    }

    #[inline]
    pub fn get(&self, index: usize) -> Vec4 {
        debug_assert!(index < self.len());
        self.values[index].into()
    }

    #[inline]
    pub fn set(&mut self, index: usize, value: Vec4) {
        debug_assert!(index < self.len());
        self.values[index] = value.into();
    }

    #[inline]
    pub fn as_slice(&self) -> &[Float4] {
        &self.values
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [Float4] {
        &mut self.values
    }

    /// The raw floats, four per record.
    pub fn as_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.values)
    }
}

/// A min/max box compressed to eight signed 16-bit values: `[min.xyz, 1, max.xyz, 1]`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[repr(C, align(16))]
pub struct Short8(pub [i16; 8]);

unsafe impl Zeroable for Short8 {}
unsafe impl Pod for Short8 {}

const_assert_eq!(mem::size_of::<Short8>(), 16);
const_assert_eq!(mem::align_of::<Short8>(), 16);

impl Short8 {
    pub fn new(low: IVec4, high: IVec4) -> Self {
        let mut value = Self::default();
        value.set_low(low);
        value.set_high(high);
        value
    }

    #[inline]
    pub fn low(&self) -> IVec4 {
        let v = &self.0;
        IVec4::new(v[0].into(), v[1].into(), v[2].into(), v[3].into())
    }

    #[inline]
    pub fn high(&self) -> IVec4 {
        let v = &self.0;
        IVec4::new(v[4].into(), v[5].into(), v[6].into(), v[7].into())
    }

    pub fn set_low(&mut self, value: IVec4) {
        for (dst, src) in self.0[..4].iter_mut().zip(value.to_array()) {
            *dst = saturate_i16(src);
        }
    }

    pub fn set_high(&mut self, value: IVec4) {
        for (dst, src) in self.0[4..].iter_mut().zip(value.to_array()) {
            *dst = saturate_i16(src);
        }
    }
}

#[inline]
fn saturate_i16(value: i32) -> i16 {
    value.clamp(i16::MIN.into(), i16::MAX.into()) as i16
}

/// A contiguous, growable array of 16-byte aligned [`Short8`] records. The low half of each record is read as one `IVec4`
/// and the high half as another.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AlignedShort8Array {
    values: Vec<Short8>,
}

impl AlignedShort8Array {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn resize(&mut self, len: usize) {
        self.values.resize(len, Short8::default());
    }

    pub fn push(&mut self, low: IVec4, high: IVec4) {
        self.values.push(Short8::new(low, high));
    }

    #[inline]
    pub fn value_low(&self, index: usize) -> IVec4 {
        debug_assert!(index < self.len());
        self.values[index].low()
    }

    #[inline]
    pub fn value_high(&self, index: usize) -> IVec4 {
        debug_assert!(index < self.len());
        self.values[index].high()
    }

    pub fn set_value_low(&mut self, value: IVec4, index: usize) {
        debug_assert!(index < self.len());
        self.values[index].set_low(value);
    }

    pub fn set_value_high(&mut self, value: IVec4, index: usize) {
        debug_assert!(index < self.len());
        self.values[index].set_high(value);
    }

    #[inline]
    pub fn as_slice(&self) -> &[Short8] {
        &self.values
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
