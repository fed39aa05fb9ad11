use iced::mouse::{self, Cursor};
use iced::widget::canvas::{self, Program};
use iced::widget::image::Handle;
use iced::{Point, Rectangle, Renderer, Size, Theme, Vector};

use crate::viewport::Viewport;
use crate::Message;

/// One wheel "line" worth of scroll, in pixels.
const LINE_SCROLL_PIXELS: f32 = 40.0;

/// Canvas renderer for the generated poster with zoom/pan support
///
/// The transform itself lives in [`Viewport`] owned by the application
/// state; this program only draws with it and translates iced events into
/// viewport messages.
pub struct PosterCanvas {
    /// Decoded poster handle for drawing
    pub handle: Handle,
    /// Pixel dimensions of the poster
    pub image_size: (u32, u32),
    /// Current pan/zoom transform
    pub viewport: Viewport,
    /// False while a generate, edit or export operation is in flight;
    /// all interaction is ignored then
    pub enabled: bool,
}

impl PosterCanvas {
    /// Rectangle the poster occupies at scale 1 with no pan: fitted into
    /// the canvas bounds (object-contain) and centered.
    fn fitted_rect(&self, bounds: Size) -> Rectangle {
        let (width, height) = self.image_size;
        let (width, height) = (width as f32, height as f32);

        // Contain, but never upscale past natural size.
        let fit = (bounds.width / width)
            .min(bounds.height / height)
            .min(1.0);
        let fitted = Size::new(width * fit, height * fit);

        Rectangle::new(
            Point::new(
                (bounds.width - fitted.width) / 2.0,
                (bounds.height - fitted.height) / 2.0,
            ),
            fitted,
        )
    }
}

impl Program<Message> for PosterCanvas {
    type State = DragState;

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());
        let rect = self.fitted_rect(bounds.size());

        // Pan first, then zoom: a point ends up at offset + scale * point,
        // matching the viewport's wheel-zoom math.
        frame.with_save(|frame| {
            frame.translate(Vector::new(
                self.viewport.offset.x,
                self.viewport.offset.y,
            ));
            frame.scale(self.viewport.scale);
            frame.draw_image(rect, canvas::Image::new(self.handle.clone()));
        });

        vec![frame.into_geometry()]
    }

    fn update(
        &self,
        state: &mut Self::State,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> (canvas::event::Status, Option<Message>) {
        if !self.enabled {
            return (canvas::event::Status::Ignored, None);
        }

        match event {
            // Mouse wheel for zooming towards the cursor
            canvas::Event::Mouse(mouse::Event::WheelScrolled { delta }) => {
                if let Some(position) = cursor.position_in(bounds) {
                    // Normalize to "positive = scroll down = zoom out".
                    let delta_y = match delta {
                        mouse::ScrollDelta::Lines { y, .. } => -y * LINE_SCROLL_PIXELS,
                        mouse::ScrollDelta::Pixels { y, .. } => -y,
                    };
                    return (
                        canvas::event::Status::Captured,
                        Some(Message::CanvasZoomed {
                            delta_y,
                            cursor: position,
                        }),
                    );
                }
            }

            // Mouse button press - start panning
            canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                if let Some(position) = cursor.position_in(bounds) {
                    state.is_dragging = true;
                    return (
                        canvas::event::Status::Captured,
                        Some(Message::PanBegan(position)),
                    );
                }
            }

            // Mouse button release - stop panning
            canvas::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) => {
                if state.is_dragging {
                    state.is_dragging = false;
                    return (canvas::event::Status::Captured, Some(Message::PanEnded));
                }
            }

            // Mouse move - pan while dragging
            canvas::Event::Mouse(mouse::Event::CursorMoved { .. }) => {
                if state.is_dragging {
                    match cursor.position_in(bounds) {
                        Some(position) => {
                            return (
                                canvas::event::Status::Captured,
                                Some(Message::PanMoved(position)),
                            );
                        }
                        // Pointer left the canvas mid-drag: end the gesture.
                        None => {
                            state.is_dragging = false;
                            return (canvas::event::Status::Captured, Some(Message::PanEnded));
                        }
                    }
                }
            }

            _ => {}
        }

        (canvas::event::Status::Ignored, None)
    }

    fn mouse_interaction(
        &self,
        state: &Self::State,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> mouse::Interaction {
        if !self.enabled || !cursor.is_over(bounds) {
            mouse::Interaction::default()
        } else if state.is_dragging {
            mouse::Interaction::Grabbing
        } else {
            mouse::Interaction::Grab
        }
    }
}

/// State for drag interactions
#[derive(Debug, Clone, Default)]
pub struct DragState {
    pub is_dragging: bool,
}
