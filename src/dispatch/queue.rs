//! # Cola Bloqueante
//! src/dispatch/queue.rs
//!
//! Cola FIFO thread-safe entre el acceptor (único productor) y los workers
//! del pool (consumidores). Un consumidor que encuentra la cola vacía se
//! duerme en la condvar hasta que llegue un elemento.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;

/// Cola FIFO bloqueante
pub struct BlockingQueue<T> {
    /// Elementos encolados; el frente es el más antiguo
    items: Arc<Mutex<VecDeque<T>>>,

    /// Condvar para despertar a un worker cuando hay un elemento nuevo
    available: Arc<Condvar>,
}

impl<T> BlockingQueue<T> {
    /// Crea una cola vacía
    pub fn new() -> Self {
        Self {
            items: Arc::new(Mutex::new(VecDeque::new())),
            available: Arc::new(Condvar::new()),
        }
    }

    /// Encola al final y despierta a exactamente un consumidor
    pub fn enqueue(&self, item: T) {
        let mut items = self.items.lock();
        items.push_back(item);
        drop(items);

        self.available.notify_one();
    }

    /// Desencola el elemento más antiguo
    ///
    /// Bloquea mientras la cola esté vacía.
    pub fn dequeue(&self) -> T {
        let mut items = self.items.lock();

        loop {
            if let Some(item) = items.pop_front() {
                return item;
            }

            // Esperar a que haya elementos
            self.available.wait(&mut items);
        }
    }

    /// Retorna el tamaño actual de la cola
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// Verifica si la cola está vacía
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for BlockingQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for BlockingQueue<T> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
            available: Arc::clone(&self.available),
        }
    }
}
