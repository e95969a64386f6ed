pub use bevy_ecs::world::World;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use winit::{application::ApplicationHandler, event::WindowEvent, window::Window};

use crate::input::{InputBus, InputEvent, InputState};
pub type Result<T> = anyhow::Result<T>;

pub mod components;
pub mod input;
pub mod layers;
pub mod prelude;

pub trait Layer: 'static {
    fn frame(&mut self, context: &LayerContext) -> Result<()>;
    fn detach(&mut self, context: &LayerContext);
}

pub trait LayerFactory: 'static {
    fn create(&self, context: &LayerContext) -> Box<dyn Layer>;
}

pub struct LayerContext {
    pub window: Arc<Window>,
    pub world: Arc<Mutex<World>>,
    pub delta_time: Duration,
}

impl LayerContext {
    /// Lock the shared world. A layer that panicked mid-frame does not take the others down.
    pub fn world(&self) -> MutexGuard<'_, World> {
        lock_world(&self.world)
    }
}

fn lock_world(world: &Mutex<World>) -> MutexGuard<'_, World> {
    world.lock().unwrap_or_else(|poisoned| {
        log::warn!("World lock poisoned, continuing with last state");
        PoisonError::into_inner(poisoned)
    })
}

pub struct ApplicationBuilder {
    title: String,
    layer_factories: Vec<Box<dyn LayerFactory>>,
}

impl ApplicationBuilder {
    pub fn new() -> Self {
        Self {
            title: String::from("vantage"),
            layer_factories: Vec::new(),
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn add_layer_factory(mut self, factory: impl LayerFactory) -> Self {
        self.layer_factories.push(Box::new(factory));
        self
    }

    pub fn add_layer<F>(mut self, factory_fn: F) -> Self
    where
        F: Fn(&LayerContext) -> Box<dyn Layer> + 'static,
    {
        self.layer_factories
            .push(Box::new(ClosureLayerFactory::new(factory_fn)));
        self
    }

    pub fn build(self) -> Application {
        let mut world = World::new();
        world.insert_resource(InputState::new());
        world.insert_resource(InputBus::new());

        Application {
            title: self.title,
            layer_factories: self.layer_factories,
            state: None,
            world: Arc::new(Mutex::new(world)),
        }
    }
}

impl Default for ApplicationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

struct ClosureLayerFactory<F> {
    factory_fn: F,
}

impl<F> ClosureLayerFactory<F> {
    fn new(factory_fn: F) -> Self {
        Self { factory_fn }
    }
}

impl<F> LayerFactory for ClosureLayerFactory<F>
where
    F: Fn(&LayerContext) -> Box<dyn Layer> + 'static,
{
    fn create(&self, context: &LayerContext) -> Box<dyn Layer> {
        (self.factory_fn)(context)
    }
}

pub struct Application {
    title: String,
    layer_factories: Vec<Box<dyn LayerFactory>>,
    state: Option<ApplicationState>,
    world: Arc<Mutex<World>>,
}

pub struct ApplicationState {
    window: Arc<Window>,
    layers: Vec<Box<dyn Layer>>,
    last_frame_time: Instant,
}

impl Application {
    fn redraw(&mut self) -> Result<()> {
        let state = match &mut self.state {
            Some(state) => state,
            None => return Ok(()),
        };

        let now = Instant::now();
        let delta_time = now.duration_since(state.last_frame_time);
        state.last_frame_time = now;

        let context = LayerContext {
            window: state.window.clone(),
            world: self.world.clone(),
            delta_time,
        };

        for layer in &mut state.layers {
            layer.frame(&context)?;
        }

        lock_world(&self.world).clear_trackers();

        Ok(())
    }

    pub fn spawn<B: bevy_ecs::bundle::Bundle>(
        &mut self,
        label: impl Into<String>,
        bundle: B,
    ) -> bevy_ecs::entity::Entity {
        use crate::prelude::*;
        let bundle = (
            Tag {
                label: label.into(),
            },
            bundle,
        );
        lock_world(&self.world).spawn(bundle).id()
    }

    /// Run setup code that needs the whole world, such as wiring entities together
    pub fn with_world<T>(&mut self, f: impl FnOnce(&mut World) -> T) -> T {
        f(&mut lock_world(&self.world))
    }

    fn publish(&self, event: InputEvent) {
        let world = lock_world(&self.world);
        if let Some(bus) = world.get_resource::<InputBus>() {
            bus.publish(&event);
        }
    }

    fn set_mouse_capture(&self, captured: bool) {
        use winit::window::CursorGrabMode;

        {
            let mut world = lock_world(&self.world);
            if let Some(mut input_state) = world.get_resource_mut::<InputState>() {
                input_state.mouse_captured = captured;
            }
        }

        let Some(app_state) = &self.state else {
            return;
        };

        if captured {
            app_state.window.set_cursor_visible(false);
            let _ = app_state
                .window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| app_state.window.set_cursor_grab(CursorGrabMode::Confined));
            log::info!("Mouse captured - use right-click or escape to release");
        } else {
            app_state.window.set_cursor_visible(true);
            let _ = app_state.window.set_cursor_grab(CursorGrabMode::None);
            log::info!("Mouse released");
        }
    }

    fn mouse_captured(&self) -> bool {
        lock_world(&self.world)
            .get_resource::<InputState>()
            .is_some_and(|input_state| input_state.mouse_captured)
    }

    fn detach_layers(&mut self) {
        if let Some(state) = &mut self.state {
            let context = LayerContext {
                window: state.window.clone(),
                world: self.world.clone(),
                delta_time: Duration::ZERO,
            };

            for layer in &mut state.layers {
                layer.detach(&context);
            }
        }
    }
}

impl ApplicationHandler for Application {
    fn resumed(&mut self, event_loop: &winit::event_loop::ActiveEventLoop) {
        let window_attributes = Window::default_attributes().with_title(self.title.clone());
        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Unable to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let context = LayerContext {
            window: window.clone(),
            world: self.world.clone(),
            delta_time: Duration::ZERO,
        };

        let layers: Vec<Box<dyn Layer>> = self
            .layer_factories
            .iter()
            .map(|factory| factory.create(&context))
            .collect();

        log::info!("Application resumed with {} layers", layers.len());

        self.state = Some(ApplicationState {
            window,
            layers,
            last_frame_time: Instant::now(),
        });
    }

    fn suspended(&mut self, _event_loop: &winit::event_loop::ActiveEventLoop) {
        self.detach_layers();
        self.state = None;
    }

    fn exiting(&mut self, _event_loop: &winit::event_loop::ActiveEventLoop) {
        self.detach_layers();
        self.state = None;

        // Dropping the entities releases their input subscriptions
        lock_world(&self.world).clear_entities();
        log::info!("Application exited");
    }

    fn window_event(
        &mut self,
        event_loop: &winit::event_loop::ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: winit::event::WindowEvent,
    ) {
        // Handle input events
        {
            use winit::event::{ElementState, MouseButton};
            use winit::keyboard::{KeyCode, PhysicalKey};

            match &event {
                WindowEvent::KeyboardInput {
                    event: key_event, ..
                } => {
                    if let PhysicalKey::Code(keycode) = key_event.physical_key {
                        match key_event.state {
                            ElementState::Pressed => {
                                if keycode == KeyCode::Escape && self.mouse_captured() {
                                    self.set_mouse_capture(false);
                                }
                                self.publish(InputEvent::KeyPressed {
                                    key: keycode,
                                    repeat: key_event.repeat,
                                });
                            }
                            ElementState::Released => {
                                self.publish(InputEvent::KeyReleased(keycode))
                            }
                        }
                    }
                }
                WindowEvent::MouseInput { state, button, .. } => {
                    // Toggle mouse capture on right click
                    if *button == MouseButton::Right && *state == ElementState::Pressed {
                        let captured = !self.mouse_captured();
                        self.set_mouse_capture(captured);
                    }
                }
                WindowEvent::Focused(false) => {
                    self.publish(InputEvent::FocusLost);
                }
                _ => {}
            }
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.redraw() {
                    log::error!("Frame failed: {:#}", e);
                }
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &winit::event_loop::ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: winit::event::DeviceEvent,
    ) {
        use winit::event::DeviceEvent;

        if let DeviceEvent::MouseMotion { delta } = event {
            if self.mouse_captured() {
                self.publish(InputEvent::PointerMotion {
                    dx: delta.0 as f32,
                    dy: delta.1 as f32,
                });
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &winit::event_loop::ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }
}
