use std::fmt;
use bit_vec::BitVec;

use crate::IntUid;
use crate::model::ClientId;

/// Fixed-length set of clients, one bit per client id.
///
/// All binary operations require equal lengths.  Bits past `len()` in the last storage
/// block are always zero.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct ClientMask {
  bits: BitVec,
}

impl ClientMask {
  pub fn new(len: usize) -> Self {
    ClientMask { bits: BitVec::from_elem(len, false) }
  }

  pub fn full(len: usize) -> Self {
    ClientMask { bits: BitVec::from_elem(len, true) }
  }

  pub fn from_members(len: usize, members: impl IntoIterator<Item=ClientId>) -> Self {
    let mut mask = Self::new(len);
    for c in members {
      mask.insert(c);
    }
    mask
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.bits.len()
  }

  #[inline]
  pub fn contains(&self, c: ClientId) -> bool {
    self.bits.get(c.index()).expect("client id out of range")
  }

  #[inline]
  pub fn set(&mut self, c: ClientId, value: bool) {
    assert!(c.index() < self.len(), "client id {} out of range", c);
    self.bits.set(c.index(), value);
  }

  #[inline]
  pub fn insert(&mut self, c: ClientId) {
    self.set(c, true)
  }

  #[inline]
  pub fn remove(&mut self, c: ClientId) {
    self.set(c, false)
  }

  /// Flip membership of `c`, returning the new state.
  pub fn toggle(&mut self, c: ClientId) -> bool {
    let now = !self.contains(c);
    self.set(c, now);
    now
  }

  pub fn count(&self) -> usize {
    self.bits.iter().filter(|&b| b).count()
  }

  pub fn is_empty(&self) -> bool {
    self.bits.none()
  }

  pub fn iter<'a>(&'a self) -> impl Iterator<Item=ClientId> + 'a {
    self.bits.iter()
      .enumerate()
      .filter_map(|(i, b)| if b { Some(ClientId::from(i)) } else { None })
  }

  pub fn to_vec(&self) -> Vec<ClientId> {
    self.iter().collect()
  }

  fn check_len(&self, other: &Self) {
    assert_eq!(self.len(), other.len(), "client masks of different lengths");
  }

  pub fn and(&self, other: &Self) -> Self {
    self.check_len(other);
    let mut bits = self.bits.clone();
    bits.intersect(&other.bits);
    ClientMask { bits }
  }

  pub fn or(&self, other: &Self) -> Self {
    self.check_len(other);
    let mut bits = self.bits.clone();
    bits.union(&other.bits);
    ClientMask { bits }
  }

  pub fn xor(&self, other: &Self) -> Self {
    self.check_len(other);
    ClientMask { bits: BitVec::from_fn(self.len(), |i| self.bits[i] != other.bits[i]) }
  }

  pub fn not(&self) -> Self {
    ClientMask { bits: BitVec::from_fn(self.len(), |i| !self.bits[i]) }
  }

  pub fn or_assign(&mut self, other: &Self) {
    self.check_len(other);
    self.bits.union(&other.bits);
  }

  /// Members of `self` not in `other`.
  pub fn minus(&self, other: &Self) -> Self {
    self.check_len(other);
    let mut bits = self.bits.clone();
    bits.difference(&other.bits);
    ClientMask { bits }
  }

  pub fn intersects(&self, other: &Self) -> bool {
    self.check_len(other);
    self.bits.blocks().zip(other.bits.blocks()).any(|(a, b)| a & b != 0)
  }

  pub(crate) fn blocks(&self) -> impl Iterator<Item=u32> + '_ {
    self.bits.blocks()
  }
}

impl fmt::Debug for ClientMask {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_set()
      .entries(self.iter().map(|c| c.raw()))
      .finish()
  }
}

/// Rendered as a 0/1 string, lowest client first.
impl fmt::Display for ClientMask {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for b in self.bits.iter() {
      f.write_str(if b { "1" } else { "0" })?;
    }
    Ok(())
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use proptest::prelude::*;

  fn mask_of(bits: &[bool]) -> ClientMask {
    ClientMask::from_members(bits.len(), bits.iter().enumerate().filter(|(_, b)| **b).map(|(i, _)| ClientId::from(i)))
  }

  fn trailing_clear(m: &ClientMask) -> bool {
    let used = m.len() % 32;
    match (used, m.blocks().last()) {
      (0, _) | (_, None) => true,
      (used, Some(last)) => last >> used == 0,
    }
  }

  fn pair() -> impl Strategy<Value=(Vec<bool>, Vec<bool>)> {
    (1..150usize).prop_flat_map(|n| (prop::collection::vec(any::<bool>(), n), prop::collection::vec(any::<bool>(), n)))
  }

  #[test]
  fn membership() {
    let mut m = ClientMask::new(5);
    assert!(m.is_empty());
    m.insert(ClientId::from(3usize));
    assert!(m.contains(ClientId::from(3usize)));
    assert_eq!(m.count(), 1);
    assert!(!m.toggle(ClientId::from(3usize)));
    assert!(m.toggle(ClientId::from(0usize)));
    assert_eq!(m.to_vec(), vec![ClientId::from(0usize)]);
    assert_eq!(m.to_string(), "10000");
    assert_eq!(format!("{:?}", m), "{0}");
  }

  #[test]
  #[should_panic]
  fn out_of_range() {
    let mut m = ClientMask::new(4);
    m.insert(ClientId::from(4usize));
  }

  #[test]
  #[should_panic]
  fn length_mismatch() {
    ClientMask::new(4).and(&ClientMask::new(5));
  }

  #[test]
  fn full_not_is_empty() {
    let m = ClientMask::full(33);
    assert_eq!(m.count(), 33);
    assert!(m.not().is_empty());
    assert!(trailing_clear(&m));
  }

  proptest! {
    #[test]
    fn algebra((a, b) in pair()) {
      let (a, b) = (mask_of(&a), mask_of(&b));
      prop_assert_eq!(&a.or(&b).and(&a), &a);
      prop_assert!(a.xor(&a).is_empty());
      prop_assert_eq!(&a.not().not(), &a);
      prop_assert_eq!(a.intersects(&b), !a.and(&b).is_empty());
      prop_assert_eq!(a.xor(&b), a.minus(&b).or(&b.minus(&a)));
      prop_assert_eq!(a.and(&b).count() + a.or(&b).count(), a.count() + b.count());
      for m in &[a.not(), a.xor(&b), a.or(&b), a.and(&b), a.minus(&b)] {
        prop_assert!(trailing_clear(m));
      }
    }
  }
}
