//! # Pool de Workers
//! src/dispatch/pool.rs
//!
//! N threads creados al arrancar, todos consumiendo de una misma
//! [`BlockingQueue`]. El acceptor encola y sigue aceptando; como mucho N
//! conexiones se atienden a la vez y el resto espera en la cola.

use super::queue::BlockingQueue;
use super::{Connection, Dispatcher};
use crate::error::{ServerError, ServerResult};
use crate::server::handler::handle_connection;
use crate::server::signal::with_dump_signal_blocked;
use crate::server::ServerContext;
use std::sync::Arc;
use std::thread;
use tracing::{debug, info};

/// Threads de larga vida que ejecutan `handler` sobre cada trabajo encolado
pub struct WorkerPool<T> {
    queue: BlockingQueue<T>,
    size: usize,
}

impl<T: Send + 'static> WorkerPool<T> {
    /// Lanza `size` workers llamados `{name}-{i}`
    ///
    /// Si algún thread no se puede crear, el error es fatal.
    pub fn spawn<F>(size: usize, name: &str, handler: F) -> ServerResult<Self>
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        let queue = BlockingQueue::new();
        let handler = Arc::new(handler);

        for index in 0..size {
            let queue = queue.clone();
            let handler = Arc::clone(&handler);
            let thread_name = format!("{}-{}", name, index);

            thread::Builder::new()
                .name(thread_name)
                .spawn(move || Self::worker_loop(index, queue, handler))
                .map_err(|source| ServerError::ThreadSpawn { index, source })?;
        }

        debug!(size, name, "Workers lanzados");
        Ok(Self { queue, size })
    }

    fn worker_loop(index: usize, queue: BlockingQueue<T>, handler: Arc<dyn Fn(T) + Send + Sync>) {
        debug!(worker = index, "Worker iniciado");

        loop {
            let job = queue.dequeue();
            handler(job);
        }
    }

    /// Encola un trabajo; nunca bloquea al productor
    pub fn submit(&self, job: T) {
        self.queue.enqueue(job);
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Trabajos que esperan un worker libre
    pub fn queued(&self) -> usize {
        self.queue.len()
    }
}

/// Estrategia de pool: cada conexión va a la cola compartida
pub struct PoolDispatcher {
    pool: WorkerPool<Connection>,
}

impl PoolDispatcher {
    /// Lanza `workers` threads con SIGUSR1 bloqueada
    pub fn new(workers: usize, ctx: ServerContext) -> ServerResult<Self> {
        let ctx = Arc::new(ctx);
        let pool = with_dump_signal_blocked(|| {
            WorkerPool::spawn(workers, "worker", move |conn: Connection| {
                handle_connection(conn, &ctx);
            })
        })??;

        info!(workers, "Pool de workers listo");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &WorkerPool<Connection> {
        &self.pool
    }
}

impl Dispatcher for PoolDispatcher {
    fn dispatch(&mut self, conn: Connection) -> ServerResult<()> {
        self.pool.submit(conn);
        Ok(())
    }
}
