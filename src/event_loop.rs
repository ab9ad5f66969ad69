// event_loop.rs

use crate::control::Controller;
use crate::messages::{EngineCommand, EngineEvent};
use crate::scheduler::Sequencer;
use crate::sink::EventSink;
use crossbeam::channel::{self, Receiver, RecvTimeoutError};
use log::{debug, error, info};
use std::io;
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// Owns one [`Sequencer`] and drives it from a single thread.
///
/// Between pulses the thread blocks on the command channel with a timeout
/// equal to the time left until the next pulse, so it wakes either for the
/// next deadline or for a command, never to spin. Commands are applied one
/// at a time in arrival order, after any pulses that were already due.
pub struct EventLoop {
    sequencer: Sequencer,
    command_rx: Receiver<EngineCommand>,
    sinks: Vec<Box<dyn EventSink>>,
    sink_failing: Vec<bool>,
    outbox: Vec<EngineEvent>,
}

impl EventLoop {
    pub fn new(
        sequencer: Sequencer,
        command_rx: Receiver<EngineCommand>,
        sinks: Vec<Box<dyn EventSink>>,
    ) -> Self {
        let sink_failing = vec![false; sinks.len()];
        EventLoop {
            sequencer,
            command_rx,
            sinks,
            sink_failing,
            outbox: Vec::new(),
        }
    }

    /// Runs until every command sender is dropped, then hands back the
    /// sequencer so its final state can be inspected.
    pub fn run(mut self) -> Sequencer {
        info!("Engine event loop started");
        self.outbox.push(EngineEvent::Initial);
        self.flush();

        loop {
            let wait = self.sequencer.poll(Instant::now(), &mut self.outbox);
            self.flush();

            let received = match wait {
                Some(wait) => self.command_rx.recv_timeout(wait),
                None => self
                    .command_rx
                    .recv()
                    .map_err(|_| RecvTimeoutError::Disconnected),
            };

            match received {
                Ok(command) => {
                    debug!("Command received: {:?}", command);
                    let now = Instant::now();
                    self.sequencer.poll(now, &mut self.outbox);
                    self.sequencer.apply(command, now, &mut self.outbox);
                    self.flush();
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    info!("Command channel closed, engine event loop exiting");
                    break;
                }
            }
        }

        self.sequencer
    }

    fn flush(&mut self) {
        for event in self.outbox.drain(..) {
            for (index, sink) in self.sinks.iter_mut().enumerate() {
                match sink.emit(&event) {
                    Ok(()) => self.sink_failing[index] = false,
                    Err(e) if self.sink_failing[index] => {
                        debug!("Sink {} still failing on {}: {}", index, event.kind(), e)
                    }
                    Err(e) => {
                        error!("Sink {} failed on {}: {}", index, event.kind(), e);
                        self.sink_failing[index] = true;
                    }
                }
            }
        }
    }
}

/// A running engine thread plus the means to control it.
pub struct EngineHandle {
    controller: Controller,
    thread: JoinHandle<Sequencer>,
}

impl EngineHandle {
    pub fn spawn(sinks: Vec<Box<dyn EventSink>>) -> io::Result<Self> {
        Self::spawn_with(Sequencer::new(), sinks)
    }

    pub fn spawn_with(sequencer: Sequencer, sinks: Vec<Box<dyn EventSink>>) -> io::Result<Self> {
        let (command_tx, command_rx) = channel::unbounded();
        let event_loop = EventLoop::new(sequencer, command_rx, sinks);
        let thread = thread::Builder::new()
            .name("pulsestep-engine".to_string())
            .spawn(move || event_loop.run())?;

        Ok(EngineHandle {
            controller: Controller::new(command_tx),
            thread,
        })
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    /// Closes this handle's command channel and waits for the thread.
    ///
    /// Blocks until every [`Controller`] clone handed out has been dropped
    /// too. Returns `None` if the engine thread panicked.
    pub fn shutdown(self) -> Option<Sequencer> {
        drop(self.controller);
        match self.thread.join() {
            Ok(sequencer) => Some(sequencer),
            Err(_) => {
                error!("Engine thread panicked");
                None
            }
        }
    }
}
