//! # Control de admisión de conexiones
//! src/server/admission.rs
//!
//! Semáforo contador que limita cuántas conexiones se atienden a la vez.
//! El loop de accept pide un [`Permit`] antes de aceptar; si se llegó al
//! techo se bloquea en un `Condvar` hasta que alguna conexión termine.
//!
//! El permiso se libera al hacer drop, así que el contador baja aunque el
//! worker termine con error o con pánico.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Counters {
    /// Conexiones activas
    active: usize,

    /// Máximo de conexiones activas observado
    peak: usize,
}

/// Techo de conexiones simultáneas
#[derive(Debug)]
pub struct Admission {
    limit: usize,
    counters: Mutex<Counters>,
    released: Condvar,
}

/// Un lugar ocupado; se devuelve al hacer drop
#[derive(Debug)]
#[must_use = "dropping the permit releases the slot immediately"]
pub struct Permit {
    admission: Arc<Admission>,
}

impl Admission {
    /// Crea el control con un techo de `limit` conexiones
    pub fn new(limit: usize) -> Arc<Self> {
        Arc::new(Self {
            limit,
            counters: Mutex::new(Counters::default()),
            released: Condvar::new(),
        })
    }

    fn counters(&self) -> MutexGuard<'_, Counters> {
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Bloquea hasta que haya un lugar libre y lo ocupa
    pub fn acquire(self: &Arc<Self>) -> Permit {
        let mut counters = self.counters();
        while counters.active >= self.limit {
            counters = self
                .released
                .wait(counters)
                .unwrap_or_else(PoisonError::into_inner);
        }
        self.occupy(&mut counters)
    }

    fn occupy(self: &Arc<Self>, counters: &mut Counters) -> Permit {
        counters.active += 1;
        counters.peak = counters.peak.max(counters.active);
        Permit {
            admission: Arc::clone(self),
        }
    }

    /// Techo configurado
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Conexiones activas en este momento
    pub fn active(&self) -> usize {
        self.counters().active
    }

    /// Máximo de conexiones activas desde el arranque
    pub fn peak(&self) -> usize {
        self.counters().peak
    }
}

impl Drop for Permit {
    fn drop(&mut self) {
        let mut counters = self.admission.counters();
        counters.active = counters.active.saturating_sub(1);
        drop(counters);
        self.admission.released.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_acquire_and_release() {
        let admission = Admission::new(2);

        let first = admission.acquire();
        let second = admission.acquire();
        assert_eq!(admission.active(), 2);

        drop(first);
        assert_eq!(admission.active(), 1);
        drop(second);
        assert_eq!(admission.active(), 0);
        assert_eq!(admission.peak(), 2);
    }

    #[test]
    fn test_acquire_blocks_until_release() {
        let admission = Admission::new(1);
        let held = admission.acquire();
        let (tx, rx) = mpsc::channel();

        let waiter = thread::spawn({
            let admission = Arc::clone(&admission);
            move || {
                let _permit = admission.acquire();
                tx.send(()).unwrap();
            }
        });

        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
        drop(held);
        rx.recv_timeout(Duration::from_secs(5)).unwrap();
        waiter.join().unwrap();

        assert_eq!(admission.active(), 0);
    }

    #[test]
    fn test_panicking_holder_releases_slot() {
        let admission = Admission::new(1);

        let result = thread::spawn({
            let admission = Arc::clone(&admission);
            move || {
                let _permit = admission.acquire();
                panic!("worker failed");
            }
        })
        .join();

        assert!(result.is_err());
        assert_eq!(admission.active(), 0);
        let _permit = admission.acquire();
        assert_eq!(admission.active(), 1);
    }

    #[test]
    fn test_ceiling_holds_under_contention() {
        let admission = Admission::new(3);
        let workers: Vec<_> = (0..16)
            .map(|_| {
                let admission = Arc::clone(&admission);
                thread::spawn(move || {
                    let _permit = admission.acquire();
                    assert!(admission.active() <= 3);
                    thread::sleep(Duration::from_millis(5));
                })
            })
            .collect();

        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(admission.active(), 0);
        assert!(admission.peak() <= 3);
    }
}
