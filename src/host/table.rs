//! Host tables - array region plus insertion-ordered map region
//!
//! Keys `1..=N` with no holes live in the array region (N is the border);
//! every other key lives in the map region in insertion order.

use super::function::HostFunction;
use super::value::{HostValue, UserData};
use super::HostError;
use core::fmt;
use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::rc::Rc;

/// Normalised table key (nil and NaN are not keys)
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum TableKey {
    Boolean(bool),
    Integer(i64),
    /// Non-integral float, by bit pattern
    Number(u64),
    String(Rc<[u8]>),
    Table(TableRef),
    Function(HostFunction),
    UserData(UserData),
}

impl TableKey {
    pub fn from_value(value: &HostValue) -> Result<Self, HostError> {
        Ok(match value {
            HostValue::Nil => return Err(HostError::new("table index is nil")),
            HostValue::Boolean(b) => TableKey::Boolean(*b),
            HostValue::Integer(i) => TableKey::Integer(*i),
            HostValue::Number(n) if n.is_nan() => return Err(HostError::new("table index is NaN")),
            HostValue::Number(n) => match value.as_integer() {
                Some(i) => TableKey::Integer(i),
                None => TableKey::Number(n.to_bits()),
            },
            HostValue::String(s) => TableKey::String(Rc::clone(s)),
            HostValue::Table(t) => TableKey::Table(t.clone()),
            HostValue::Function(f) => TableKey::Function(f.clone()),
            HostValue::UserData(u) => TableKey::UserData(u.clone()),
        })
    }

    pub fn to_value(&self) -> HostValue {
        match self {
            TableKey::Boolean(b) => HostValue::Boolean(*b),
            TableKey::Integer(i) => HostValue::Integer(*i),
            TableKey::Number(bits) => HostValue::Number(f64::from_bits(*bits)),
            TableKey::String(s) => HostValue::String(Rc::clone(s)),
            TableKey::Table(t) => HostValue::Table(t.clone()),
            TableKey::Function(f) => HostValue::Function(f.clone()),
            TableKey::UserData(u) => HostValue::UserData(u.clone()),
        }
    }

    /// Integer and integral-float keys count as numeric
    pub fn is_numeric(&self) -> bool {
        matches!(self, TableKey::Integer(_) | TableKey::Number(_))
    }
}

impl fmt::Debug for TableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.to_value())
    }
}

#[derive(Default)]
pub struct Table {
    array: Vec<HostValue>,
    map: Vec<(TableKey, HostValue)>,
    index: HashMap<TableKey, usize>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Border of the array region
    pub fn len(&self) -> usize {
        self.array.len()
    }

    pub fn is_empty(&self) -> bool {
        self.array.is_empty() && self.map.is_empty()
    }

    pub fn array(&self) -> &[HostValue] {
        &self.array
    }

    /// Map-region entries in insertion order
    pub fn map_entries(&self) -> impl Iterator<Item = (&TableKey, &HostValue)> {
        self.map.iter().map(|(k, v)| (k, v))
    }

    pub fn get(&self, key: &HostValue) -> HostValue {
        match TableKey::from_value(key) {
            Ok(key) => self.get_key(&key),
            Err(_) => HostValue::Nil,
        }
    }

    pub fn get_key(&self, key: &TableKey) -> HostValue {
        if let TableKey::Integer(i) = key {
            if *i >= 1 && (*i as usize) <= self.array.len() {
                return self.array[*i as usize - 1].clone();
            }
        }
        self.index
            .get(key)
            .map(|&slot| self.map[slot].1.clone())
            .unwrap_or_default()
    }

    pub fn get_str(&self, name: &str) -> HostValue {
        self.get_key(&TableKey::String(Rc::from(name.as_bytes())))
    }

    pub fn set(&mut self, key: HostValue, value: HostValue) -> Result<(), HostError> {
        let key = TableKey::from_value(&key)?;
        self.set_key(key, value);
        Ok(())
    }

    pub fn set_str(&mut self, name: &str, value: HostValue) {
        self.set_key(TableKey::String(Rc::from(name.as_bytes())), value);
    }

    /// Append at the border
    pub fn push(&mut self, value: HostValue) {
        let next = self.array.len() as i64 + 1;
        self.set_key(TableKey::Integer(next), value);
    }

    pub fn set_key(&mut self, key: TableKey, value: HostValue) {
        if let TableKey::Integer(i) = key {
            let len = self.array.len() as i64;
            if i >= 1 && i <= len {
                let slot = i as usize - 1;
                if value.is_nil() {
                    let tail = self.array.split_off(slot);
                    for (offset, moved) in tail.into_iter().enumerate().skip(1) {
                        self.map_insert(TableKey::Integer(i + offset as i64), moved);
                    }
                } else {
                    self.array[slot] = value;
                }
                return;
            }
            if i == len + 1 && !value.is_nil() {
                self.map_remove(&key);
                self.array.push(value);
                self.migrate_border();
                return;
            }
        }

        if value.is_nil() {
            self.map_remove(&key);
        } else {
            self.map_insert(key, value);
        }
    }

    /// Pull keys `N+1, N+2, ...` from the map region into the array region
    fn migrate_border(&mut self) {
        loop {
            let next = TableKey::Integer(self.array.len() as i64 + 1);
            match self.map_remove(&next) {
                Some(value) => self.array.push(value),
                None => break,
            }
        }
    }

    fn map_insert(&mut self, key: TableKey, value: HostValue) {
        match self.index.get(&key) {
            Some(&slot) => self.map[slot].1 = value,
            None => {
                self.index.insert(key.clone(), self.map.len());
                self.map.push((key, value));
            }
        }
    }

    fn map_remove(&mut self, key: &TableKey) -> Option<HostValue> {
        let slot = self.index.remove(key)?;
        let (_, value) = self.map.remove(slot);
        for (k, _) in &self.map[slot..] {
            if let Some(i) = self.index.get_mut(k) {
                *i -= 1;
            }
        }
        Some(value)
    }

    /// All entries: array region as `1..=N`, then the map region
    pub fn pairs(&self) -> Vec<(HostValue, HostValue)> {
        self.array
            .iter()
            .enumerate()
            .map(|(i, v)| (HostValue::Integer(i as i64 + 1), v.clone()))
            .chain(self.map.iter().map(|(k, v)| (k.to_value(), v.clone())))
            .collect()
    }
}

/// Shared handle to a table; equality and hashing are by identity
#[derive(Clone, Default)]
pub struct TableRef(Rc<RefCell<Table>>);

impl TableRef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_table(table: Table) -> Self {
        Self(Rc::new(RefCell::new(table)))
    }

    /// Table whose array region holds `values`; nils are skipped
    pub fn from_values(values: impl IntoIterator<Item = HostValue>) -> Self {
        let mut table = Table::new();
        for value in values {
            table.push(value);
        }
        Self::from_table(table)
    }

    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }

    pub fn borrow(&self) -> Ref<'_, Table> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Table> {
        self.0.borrow_mut()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn get(&self, key: impl Into<HostValue>) -> HostValue {
        self.0.borrow().get(&key.into())
    }

    pub fn get_str(&self, name: &str) -> HostValue {
        self.0.borrow().get_str(name)
    }

    pub fn set(&self, key: impl Into<HostValue>, value: impl Into<HostValue>) -> Result<(), HostError> {
        self.0.borrow_mut().set(key.into(), value.into())
    }

    pub fn set_str(&self, name: &str, value: impl Into<HostValue>) {
        self.0.borrow_mut().set_str(name, value.into());
    }

    pub fn push(&self, value: impl Into<HostValue>) {
        self.0.borrow_mut().push(value.into());
    }

    /// Snapshot of the array region
    pub fn array_values(&self) -> Vec<HostValue> {
        self.0.borrow().array().to_vec()
    }

    pub fn pairs(&self) -> Vec<(HostValue, HostValue)> {
        self.0.borrow().pairs()
    }
}

impl PartialEq for TableRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for TableRef {}

impl core::hash::Hash for TableRef {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl fmt::Debug for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "table: {:#x}", self.id())
    }
}
