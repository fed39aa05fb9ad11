use std::fmt;
use std::path::PathBuf;

use cgmath::Vector2;
use chrono::Utc;
use iced::widget::{
    button, center, column, container, horizontal_space, image as image_widget, mouse_area,
    opaque, row, scrollable, stack, text, text_input, Canvas,
};
use iced::{Alignment, Color, Element, Length, Point, Task, Theme};
use iced_aw::Wrap;
use rfd::FileDialog;

// Declare the application modules
mod config;
mod gemini;
mod geometry;
mod raster;
mod state;
mod suggest;
mod ui;
mod viewport;

use config::AppConfig;
use gemini::{EditPosterParams, GeminiClient, GeneratePosterParams};
use geometry::AspectRatio;
use raster::QualityTier;
use state::data::{mime_for_path, ImageObject, SourceImage};
use state::gallery::Gallery;
use suggest::{FilesChanged, SuggestionDebouncer};
use ui::canvas::PosterCanvas;
use viewport::Viewport;

/// The poster currently on the canvas, with what the canvas needs to draw it
#[derive(Debug, Clone)]
struct PosterView {
    /// The encoded poster as returned by the model
    image: ImageObject,
    /// Decoded pixel width
    width: u32,
    /// Decoded pixel height
    height: u32,
    /// iced handle over the same bytes, reused across frames
    handle: image_widget::Handle,
}

/// Result payload of a finished generate or edit call
#[derive(Debug, Clone)]
struct GeneratedPoster {
    image: ImageObject,
    width: u32,
    height: u32,
}

/// The single outstanding generate-or-edit operation. The triggering
/// controls and the canvas are disabled while one is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Busy {
    Generating,
    Editing,
}

impl Busy {
    fn message(self) -> &'static str {
        match self {
            Busy::Generating => "Generating poster...",
            Busy::Editing => "Applying edits...",
        }
    }
}

/// User-visible, dismissible errors. None of them corrupt the poster, the
/// gallery or the viewport; dismissing one returns the UI to where it was.
#[derive(Debug, Clone)]
enum UserError {
    /// Required input missing; validated before any remote call
    MissingInput(&'static str),
    /// A remote call failed; shown with a generic message, never retried
    /// automatically
    RemoteCall(String),
    /// A picked file could not be read
    FileLoad(String),
}

impl fmt::Display for UserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserError::MissingInput(message) => f.write_str(message),
            UserError::RemoteCall(message) | UserError::FileLoad(message) => {
                f.write_str(message)
            }
        }
    }
}

/// Which poster a download dialog was opened for.
#[derive(Debug, Clone, Copy)]
enum DownloadTarget {
    /// The poster currently on the canvas
    Current,
    /// A gallery entry, by position
    Gallery(usize),
}

/// State of the open download dialog
#[derive(Debug, Clone)]
struct DownloadDialog {
    poster: ImageObject,
    aspect_ratio: AspectRatio,
    /// Tier currently exporting, if any
    exporting: Option<QualityTier>,
    /// Export failure; shown inside the dialog only
    error: Option<String>,
}

/// Main application state
struct PosterFusion {
    /// Gemini client, present once an API key is configured
    client: Option<GeminiClient>,
    /// Product images driving generation and concept suggestions
    product_images: Vec<SourceImage>,
    /// Optional style reference, sent as the last image of a generation
    reference_image: Option<SourceImage>,
    /// Creative brief; pre-filled by suggestions, freely editable
    concept: String,
    /// Aspect ratio for the next generation and for exports
    aspect_ratio: AspectRatio,
    /// Instruction for editing the current poster
    edit_prompt: String,
    /// The poster shown on the canvas
    poster: Option<PosterView>,
    /// Pan/zoom transform of the canvas
    viewport: Viewport,
    /// Posters saved this session
    gallery: Gallery,
    /// One iced handle per gallery entry, kept in step with the gallery
    /// so thumbnails are not re-uploaded every frame
    gallery_handles: Vec<image_widget::Handle>,
    /// Concept suggestion debouncer
    suggest: SuggestionDebouncer,
    /// The in-flight generate/edit operation, if any
    busy: Option<Busy>,
    /// Dismissible user-facing error
    error: Option<UserError>,
    /// Download dialog, when open
    download: Option<DownloadDialog>,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    // Controls
    PickProductImages,
    ClearProductImages,
    ProductImagesLoaded(Result<Vec<SourceImage>, String>),
    PickReferenceImage,
    ClearReferenceImage,
    ReferenceImageLoaded(Result<Vec<SourceImage>, String>),
    ConceptChanged(String),
    AspectRatioSelected(AspectRatio),
    EditPromptChanged(String),
    Generate,
    GenerateFinished(Result<GeneratedPoster, String>),
    ApplyEdit,
    EditFinished(Result<GeneratedPoster, String>),
    DismissError,

    // Concept suggestions
    SuggestTimerElapsed(u64),
    SuggestFinished(u64, Result<String, String>),

    // Canvas
    CanvasZoomed { delta_y: f32, cursor: Point },
    PanBegan(Point),
    PanMoved(Point),
    PanEnded,
    ResetView,
    SaveToGallery,

    // Gallery and downloads
    ClearGallery,
    OpenDownload(DownloadTarget),
    CloseDownload,
    ExportTier(QualityTier),
    ExportFinished(Result<PathBuf, String>),
}

impl PosterFusion {
    /// Create a new instance of the application
    fn new() -> (Self, Task<Message>) {
        let config = AppConfig::load();
        let client = match config.resolve_api_key() {
            Some(key) => Some(GeminiClient::new(key)),
            None => {
                eprintln!(
                    "⚠️  No Gemini API key configured. Set GEMINI_API_KEY or add \"api_key\" to {}.",
                    AppConfig::config_path().display()
                );
                None
            }
        };

        println!("🎨 Poster Fusion ready");

        (
            PosterFusion {
                client,
                product_images: Vec::new(),
                reference_image: None,
                concept: String::new(),
                aspect_ratio: AspectRatio::default(),
                edit_prompt: String::new(),
                poster: None,
                viewport: Viewport::default(),
                gallery: Gallery::new(),
                gallery_handles: Vec::new(),
                suggest: SuggestionDebouncer::new(),
                busy: None,
                error: None,
                download: None,
            },
            Task::none(),
        )
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::PickProductImages => {
                let files = FileDialog::new()
                    .set_title("Select Product Images")
                    .add_filter("Images", &["png", "jpg", "jpeg", "webp"])
                    .pick_files();

                match files {
                    Some(paths) => {
                        Task::perform(load_images(paths), Message::ProductImagesLoaded)
                    }
                    None => Task::none(),
                }
            }
            Message::ProductImagesLoaded(Ok(images)) => {
                self.product_images = images;
                // New inputs reset the canvas, and with it the viewport.
                self.poster = None;
                self.viewport.reset();
                self.error = None;
                self.schedule_suggestion()
            }
            Message::ProductImagesLoaded(Err(message)) => {
                self.error = Some(UserError::FileLoad(message));
                Task::none()
            }
            Message::ClearProductImages => {
                self.product_images.clear();
                self.poster = None;
                self.viewport.reset();
                self.schedule_suggestion()
            }
            Message::PickReferenceImage => {
                let file = FileDialog::new()
                    .set_title("Select Style Reference")
                    .add_filter("Images", &["png", "jpg", "jpeg", "webp"])
                    .pick_file();

                match file {
                    Some(path) => {
                        Task::perform(load_images(vec![path]), Message::ReferenceImageLoaded)
                    }
                    None => Task::none(),
                }
            }
            Message::ReferenceImageLoaded(Ok(mut images)) => {
                self.reference_image = images.pop();
                Task::none()
            }
            Message::ReferenceImageLoaded(Err(message)) => {
                self.error = Some(UserError::FileLoad(message));
                Task::none()
            }
            Message::ClearReferenceImage => {
                self.reference_image = None;
                Task::none()
            }
            Message::ConceptChanged(concept) => {
                self.concept = concept;
                self.suggest.concept_edited();
                Task::none()
            }
            Message::AspectRatioSelected(aspect_ratio) => {
                self.aspect_ratio = aspect_ratio;
                Task::none()
            }
            Message::EditPromptChanged(edit_prompt) => {
                self.edit_prompt = edit_prompt;
                Task::none()
            }
            Message::Generate => {
                if self.busy.is_some() {
                    return Task::none();
                }
                if self.product_images.is_empty() {
                    self.error = Some(UserError::MissingInput(
                        "Upload at least one product image first.",
                    ));
                    return Task::none();
                }
                if self.concept.trim().is_empty() {
                    self.error = Some(UserError::MissingInput(
                        "Provide a concept for the poster.",
                    ));
                    return Task::none();
                }
                let Some(client) = self.client.clone() else {
                    self.error = Some(UserError::MissingInput(
                        "No Gemini API key configured. Set GEMINI_API_KEY and restart.",
                    ));
                    return Task::none();
                };

                self.busy = Some(Busy::Generating);
                self.error = None;

                let params = GeneratePosterParams {
                    product_images: self
                        .product_images
                        .iter()
                        .map(|source| source.image.clone())
                        .collect(),
                    concept: self.concept.trim().to_owned(),
                    aspect_ratio: self.aspect_ratio,
                    reference_image: self
                        .reference_image
                        .as_ref()
                        .map(|source| source.image.clone()),
                };

                Task::perform(run_generate(client, params), Message::GenerateFinished)
            }
            Message::GenerateFinished(Ok(poster)) => {
                self.busy = None;
                println!("✅ Poster generated ({}x{})", poster.width, poster.height);
                self.set_poster(poster);
                Task::none()
            }
            Message::GenerateFinished(Err(message)) => {
                self.busy = None;
                self.error = Some(UserError::RemoteCall(message));
                Task::none()
            }
            Message::ApplyEdit => {
                if self.busy.is_some() {
                    return Task::none();
                }
                let Some(poster) = &self.poster else {
                    self.error = Some(UserError::MissingInput(
                        "Generate a poster before you can edit it.",
                    ));
                    return Task::none();
                };
                if self.edit_prompt.trim().is_empty() {
                    self.error = Some(UserError::MissingInput("Provide an edit instruction."));
                    return Task::none();
                }
                let Some(client) = self.client.clone() else {
                    self.error = Some(UserError::MissingInput(
                        "No Gemini API key configured. Set GEMINI_API_KEY and restart.",
                    ));
                    return Task::none();
                };

                self.busy = Some(Busy::Editing);
                self.error = None;

                let params = EditPosterParams {
                    current_poster: poster.image.clone(),
                    instruction: self.edit_prompt.trim().to_owned(),
                };

                Task::perform(run_edit(client, params), Message::EditFinished)
            }
            Message::EditFinished(Ok(poster)) => {
                self.busy = None;
                self.edit_prompt.clear();
                println!("✏️  Edit applied ({}x{})", poster.width, poster.height);
                self.set_poster(poster);
                Task::none()
            }
            Message::EditFinished(Err(message)) => {
                self.busy = None;
                self.error = Some(UserError::RemoteCall(message));
                Task::none()
            }
            Message::DismissError => {
                self.error = None;
                Task::none()
            }

            Message::SuggestTimerElapsed(generation) => {
                let Some(client) = self.client.clone() else {
                    // Suggestions are optional; without a key we skip them.
                    return Task::none();
                };
                if !self.suggest.timer_elapsed(generation) {
                    return Task::none();
                }

                let images: Vec<ImageObject> = self
                    .product_images
                    .iter()
                    .map(|source| source.image.clone())
                    .collect();

                Task::perform(
                    async move {
                        let result = client
                            .suggest_concept(&images)
                            .await
                            .map_err(|err| err.to_string());
                        (generation, result)
                    },
                    |(generation, result)| Message::SuggestFinished(generation, result),
                )
            }
            Message::SuggestFinished(generation, result) => {
                let apply = self.suggest.request_finished(generation);
                match result {
                    Ok(concept) if apply => self.concept = concept,
                    Ok(_) => {}
                    // Suggestion failures never block the main workflow.
                    Err(err) => eprintln!("⚠️  Concept suggestion failed: {err}"),
                }
                Task::none()
            }

            Message::CanvasZoomed { delta_y, cursor } => {
                if self.canvas_interactive() {
                    self.viewport
                        .wheel_zoom(delta_y, Vector2::new(cursor.x, cursor.y));
                }
                Task::none()
            }
            Message::PanBegan(position) => {
                if self.canvas_interactive() {
                    self.viewport
                        .begin_pan(Vector2::new(position.x, position.y));
                }
                Task::none()
            }
            Message::PanMoved(position) => {
                if self.canvas_interactive() {
                    self.viewport.pan_to(Vector2::new(position.x, position.y));
                }
                Task::none()
            }
            Message::PanEnded => {
                self.viewport.end_pan();
                Task::none()
            }
            Message::ResetView => {
                self.viewport.reset();
                Task::none()
            }
            Message::SaveToGallery => {
                if let Some(poster) = &self.poster {
                    if self.gallery.save(poster.image.clone(), self.aspect_ratio) {
                        self.gallery_handles.push(poster.handle.clone());
                        println!("📌 Poster saved to gallery ({} total)", self.gallery.len());
                    }
                }
                Task::none()
            }

            Message::ClearGallery => {
                self.gallery.clear();
                self.gallery_handles.clear();
                Task::none()
            }
            Message::OpenDownload(target) => {
                let selected = match target {
                    DownloadTarget::Current => self
                        .poster
                        .as_ref()
                        .map(|poster| (poster.image.clone(), self.aspect_ratio)),
                    DownloadTarget::Gallery(index) => self
                        .gallery
                        .entries()
                        .get(index)
                        .map(|entry| (entry.poster.clone(), entry.aspect_ratio)),
                };

                if let Some((poster, aspect_ratio)) = selected {
                    self.download = Some(DownloadDialog {
                        poster,
                        aspect_ratio,
                        exporting: None,
                        error: None,
                    });
                }
                Task::none()
            }
            Message::CloseDownload => {
                self.download = None;
                Task::none()
            }
            Message::ExportTier(tier) => {
                let Some(dialog) = &mut self.download else {
                    return Task::none();
                };
                if dialog.exporting.is_some() {
                    return Task::none();
                }

                let file_name = format!(
                    "poster-{}-{}.png",
                    tier.file_slug(),
                    Utc::now().timestamp_millis()
                );
                let Some(path) = FileDialog::new()
                    .set_title("Save Poster")
                    .set_file_name(&file_name)
                    .save_file()
                else {
                    return Task::none();
                };

                dialog.exporting = Some(tier);
                dialog.error = None;

                let poster = dialog.poster.clone();
                let (width, height) = tier.dimensions(dialog.aspect_ratio);
                Task::perform(
                    export_poster(poster, width, height, path),
                    Message::ExportFinished,
                )
            }
            Message::ExportFinished(result) => {
                match result {
                    Ok(path) => {
                        println!("💾 Poster exported to {}", path.display());
                        self.download = None;
                    }
                    Err(message) => {
                        if let Some(dialog) = &mut self.download {
                            dialog.exporting = None;
                            dialog.error = Some(message);
                        } else {
                            eprintln!("⚠️  Export failed after the dialog was closed: {message}");
                        }
                    }
                }
                Task::none()
            }
        }
    }

    /// Restart the debounce window after a product-image change, or clear
    /// the concept when no images are left.
    fn schedule_suggestion(&mut self) -> Task<Message> {
        match self.suggest.files_changed(self.product_images.len()) {
            FilesChanged::Clear => {
                self.concept.clear();
                Task::none()
            }
            FilesChanged::Debounce(generation) => Task::perform(
                async move {
                    tokio::time::sleep(suggest::QUIET_PERIOD).await;
                    generation
                },
                Message::SuggestTimerElapsed,
            ),
        }
    }

    /// Show a newly produced poster. The viewport resets because the
    /// displayed image changed identity.
    fn set_poster(&mut self, generated: GeneratedPoster) {
        let handle = image_widget::Handle::from_bytes(generated.image.bytes.clone());
        self.poster = Some(PosterView {
            image: generated.image,
            width: generated.width,
            height: generated.height,
            handle,
        });
        self.viewport.reset();
    }

    /// Pan/zoom input is honored only while a poster is displayed and no
    /// generate/edit operation is in flight.
    fn canvas_interactive(&self) -> bool {
        self.poster.is_some() && self.busy.is_none()
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let header = container(
            column![
                text("Poster Fusion").size(40),
                text("Create product posters with the power of Gemini").size(14),
            ]
            .spacing(4)
            .align_x(Alignment::Center),
        )
        .width(Length::Fill)
        .center_x(Length::Fill);

        let mut content = column![header].spacing(16).padding(16);

        if let Some(error) = &self.error {
            content = content.push(self.error_banner(error));
        }

        content = content.push(
            row![
                self.control_panel(),
                self.canvas_panel(),
                self.gallery_panel(),
            ]
            .spacing(16)
            .height(Length::Fill),
        );

        let base: Element<Message> = content.into();

        match &self.download {
            Some(dialog) => stack![base, self.download_overlay(dialog)].into(),
            None => base,
        }
    }

    fn error_banner(&self, error: &UserError) -> Element<Message> {
        container(
            row![
                text(format!("Error: {error}")).size(14),
                horizontal_space(),
                button(text("Dismiss").size(13))
                    .style(button::danger)
                    .on_press(Message::DismissError),
            ]
            .spacing(8)
            .align_y(Alignment::Center),
        )
        .width(Length::Fill)
        .padding(10)
        .style(|theme: &Theme| {
            let palette = theme.extended_palette();
            container::Style {
                background: Some(palette.danger.weak.color.into()),
                text_color: Some(palette.danger.weak.text),
                border: iced::border::rounded(8),
                ..container::Style::default()
            }
        })
        .into()
    }

    fn control_panel(&self) -> Element<Message> {
        let product_summary = match self.product_images.as_slice() {
            [] => "No files selected".to_owned(),
            [single] => single.file_name.clone(),
            many => format!("{} files selected", many.len()),
        };
        let mut product_row =
            row![button(text("Upload Images").size(13)).on_press(Message::PickProductImages)]
                .spacing(8);
        if !self.product_images.is_empty() {
            product_row = product_row.push(
                button(text("Clear").size(13))
                    .style(button::secondary)
                    .on_press(Message::ClearProductImages),
            );
        }

        let reference_summary = match &self.reference_image {
            Some(source) => source.file_name.clone(),
            None => "Optional".to_owned(),
        };
        let mut reference_row =
            row![button(text("Upload Reference").size(13)).on_press(Message::PickReferenceImage)]
                .spacing(8);
        if self.reference_image.is_some() {
            reference_row = reference_row.push(
                button(text("Clear").size(13))
                    .style(button::secondary)
                    .on_press(Message::ClearReferenceImage),
            );
        }

        let concept_placeholder = if self.suggest.is_suggesting() {
            "AI is drafting a concept..."
        } else {
            "e.g. 'A futuristic city at night with neon lights'"
        };
        let mut concept_input = text_input(concept_placeholder, &self.concept).padding(8);
        if !self.suggest.is_suggesting() {
            concept_input = concept_input.on_input(Message::ConceptChanged);
        }

        let ratio_buttons = AspectRatio::ALL
            .into_iter()
            .fold(row![].spacing(6), |buttons, ratio| {
                let style = if ratio == self.aspect_ratio {
                    button::primary
                } else {
                    button::secondary
                };
                buttons.push(
                    button(text(ratio.label()).size(13))
                        .style(style)
                        .on_press(Message::AspectRatioSelected(ratio)),
                )
            });

        let can_generate = self.busy.is_none()
            && !self.product_images.is_empty()
            && !self.concept.trim().is_empty();
        let generate_label = if self.busy == Some(Busy::Generating) {
            "Generating..."
        } else {
            "Generate Poster"
        };
        let generate = button(text(generate_label))
            .on_press_maybe(can_generate.then_some(Message::Generate))
            .width(Length::Fill)
            .padding(10);

        let mut panel = column![
            text("Controls").size(24),
            text("1. Product Image(s)").size(14),
            product_row,
            text(product_summary).size(12),
            text("2. Style Reference (Optional)").size(14),
            reference_row,
            text(reference_summary).size(12),
            text("3. Poster Concept").size(14),
            concept_input,
            text("4. Aspect Ratio").size(14),
            ratio_buttons,
            generate,
        ]
        .spacing(10);

        if self.poster.is_some() {
            let can_edit = self.busy.is_none() && !self.edit_prompt.trim().is_empty();
            let edit_label = if self.busy == Some(Busy::Editing) {
                "Applying..."
            } else {
                "Apply Edit"
            };

            panel = panel
                .push(text("Iterate & Refine").size(18))
                .push(
                    text_input(
                        "e.g. 'Change the background to a beach'",
                        &self.edit_prompt,
                    )
                    .on_input(Message::EditPromptChanged)
                    .padding(8),
                )
                .push(
                    button(text(edit_label))
                        .on_press_maybe(can_edit.then_some(Message::ApplyEdit))
                        .width(Length::Fill)
                        .padding(10),
                );
        }

        container(scrollable(panel))
            .width(300)
            .height(Length::Fill)
            .padding(16)
            .style(container::rounded_box)
            .into()
    }

    fn canvas_panel(&self) -> Element<Message> {
        let body: Element<Message> = if let Some(busy) = self.busy {
            center(text(busy.message()).size(18)).into()
        } else if let Some(poster) = &self.poster {
            let canvas = Canvas::new(PosterCanvas {
                handle: poster.handle.clone(),
                image_size: (poster.width, poster.height),
                viewport: self.viewport,
                // No pan/zoom while an export dialog is up.
                enabled: self.download.is_none(),
            })
            .width(Length::Fill)
            .height(Length::Fill);

            let actions = row![
                button(text("Reset View").size(13))
                    .style(button::secondary)
                    .on_press(Message::ResetView),
                button(text("Save to Gallery").size(13))
                    .style(button::secondary)
                    .on_press(Message::SaveToGallery),
                button(text("Download").size(13))
                    .on_press(Message::OpenDownload(DownloadTarget::Current)),
            ]
            .spacing(8);

            column![actions, canvas].spacing(8).into()
        } else {
            center(
                column![
                    text("Your generated poster will appear here.").size(16),
                    text("Fill out the controls and click Generate.").size(13),
                ]
                .spacing(4)
                .align_x(Alignment::Center),
            )
            .into()
        };

        container(body)
            .width(Length::Fill)
            .height(Length::Fill)
            .padding(12)
            .style(container::rounded_box)
            .into()
    }

    fn gallery_panel(&self) -> Element<Message> {
        let mut header = row![text("Gallery").size(24), horizontal_space()]
            .spacing(8)
            .align_y(Alignment::Center);
        if !self.gallery.is_empty() {
            header = header.push(
                button(text("Clear").size(13))
                    .style(button::danger)
                    .on_press(Message::ClearGallery),
            );
        }

        let body: Element<Message> = if self.gallery.is_empty() {
            center(text("Save posters with \"Save to Gallery\".").size(13)).into()
        } else {
            let thumbnails: Vec<Element<Message>> = self
                .gallery
                .entries()
                .iter()
                .zip(&self.gallery_handles)
                .enumerate()
                .map(|(index, (_entry, handle))| {
                    column![
                        image_widget(handle.clone()).width(120.0),
                        button(text("Download").size(12))
                            .style(button::secondary)
                            .on_press(Message::OpenDownload(DownloadTarget::Gallery(index))),
                    ]
                    .spacing(4)
                    .into()
                })
                .collect();

            scrollable(Wrap::with_elements(thumbnails).spacing(8.0).line_spacing(8.0))
                .height(Length::Fill)
                .into()
        };

        container(column![header, body].spacing(10))
            .width(280)
            .height(Length::Fill)
            .padding(16)
            .style(container::rounded_box)
            .into()
    }

    fn download_overlay(&self, dialog: &DownloadDialog) -> Element<Message> {
        let mut tiers = column![].spacing(8);
        for tier in QualityTier::ALL {
            let (width, height) = tier.dimensions(dialog.aspect_ratio);
            tiers = tiers.push(
                button(
                    column![
                        text(tier.label()).size(16),
                        text(format!("{width} x {height} px")).size(13),
                    ]
                    .spacing(2),
                )
                .width(Length::Fill)
                .padding(10)
                .style(button::secondary)
                .on_press_maybe(dialog.exporting.is_none().then_some(Message::ExportTier(tier))),
            );
        }

        let mut body = column![row![
            text("Select Download Quality").size(20),
            horizontal_space(),
            button(text("Close").size(13))
                .style(button::secondary)
                .on_press(Message::CloseDownload),
        ]
        .align_y(Alignment::Center)]
        .spacing(12);

        if let Some(message) = &dialog.error {
            body = body.push(text(message.clone()).size(13).style(text::danger));
        }
        body = body.push(tiers);
        if let Some(tier) = dialog.exporting {
            body = body.push(text(format!("Exporting {}...", tier.label())).size(13));
        }

        let card = container(body)
            .width(380)
            .padding(20)
            .style(container::rounded_box);

        // Dim the app behind the dialog; clicking the backdrop closes it.
        opaque(
            mouse_area(center(opaque(card)).style(|_theme: &Theme| container::Style {
                background: Some(
                    Color {
                        a: 0.6,
                        ..Color::BLACK
                    }
                    .into(),
                ),
                ..container::Style::default()
            }))
            .on_press(Message::CloseDownload),
        )
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn main() -> iced::Result {
    iced::application("Poster Fusion", PosterFusion::update, PosterFusion::view)
        .theme(PosterFusion::theme)
        .centered()
        .run_with(PosterFusion::new)
}

/// Read picked image files into memory.
async fn load_images(paths: Vec<PathBuf>) -> Result<Vec<SourceImage>, String> {
    let mut images = Vec::with_capacity(paths.len());
    for path in paths {
        let Some(mime_type) = mime_for_path(&path) else {
            return Err(format!("Unsupported image type: {}", path.display()));
        };
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|err| format!("Failed to read {}: {err}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        images.push(SourceImage {
            file_name,
            image: ImageObject::new(bytes, mime_type),
        });
    }
    Ok(images)
}

/// Run a generation request and decode the result's dimensions.
async fn run_generate(
    client: GeminiClient,
    params: GeneratePosterParams,
) -> Result<GeneratedPoster, String> {
    let image = client
        .generate_poster(params)
        .await
        .map_err(|err| format!("Failed to generate poster: {err}"))?;
    probe_dimensions(image).await
}

/// Run an edit request and decode the result's dimensions.
async fn run_edit(
    client: GeminiClient,
    params: EditPosterParams,
) -> Result<GeneratedPoster, String> {
    let image = client
        .edit_poster(params)
        .await
        .map_err(|err| format!("Failed to edit poster: {err}"))?;
    probe_dimensions(image).await
}

/// Decode the poster's pixel dimensions off the UI thread so the canvas
/// can lay it out.
async fn probe_dimensions(image: ImageObject) -> Result<GeneratedPoster, String> {
    tokio::task::spawn_blocking(move || {
        let decoded = image::load_from_memory(&image.bytes)
            .map_err(|err| format!("The model returned an unreadable image: {err}"))?;
        Ok(GeneratedPoster {
            width: decoded.width(),
            height: decoded.height(),
            image,
        })
    })
    .await
    .map_err(|err| format!("Image task failed: {err}"))?
}

/// Resize the poster to the chosen tier's dimensions and write it to
/// `path`. The resize is pure CPU and runs on a blocking thread.
async fn export_poster(
    poster: ImageObject,
    width: u32,
    height: u32,
    path: PathBuf,
) -> Result<PathBuf, String> {
    let png = tokio::task::spawn_blocking(move || raster::resize(&poster, width, height))
        .await
        .map_err(|err| format!("Export task failed: {err}"))?
        .map_err(|err| err.to_string())?;

    tokio::fs::write(&path, png)
        .await
        .map_err(|err| format!("Could not write {}: {err}", path.display()))?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> PosterFusion {
        PosterFusion::new().0
    }

    fn sample_poster() -> GeneratedPoster {
        let image = raster::blank_canvas(AspectRatio::Square);
        GeneratedPoster {
            image,
            width: 1024,
            height: 1024,
        }
    }

    #[test]
    fn test_new_poster_resets_viewport() {
        let mut app = app();
        app.viewport.begin_pan(Vector2::new(0.0, 0.0));
        app.viewport.pan_to(Vector2::new(250.0, -80.0));
        app.viewport.wheel_zoom(-900.0, Vector2::new(10.0, 10.0));

        let _ = app.update(Message::GenerateFinished(Ok(sample_poster())));

        assert!(app.poster.is_some());
        assert_eq!(app.viewport, Viewport::default());
        assert_eq!(app.busy, None);
    }

    #[test]
    fn test_generate_without_inputs_is_rejected() {
        let mut app = app();
        let _ = app.update(Message::Generate);
        assert!(matches!(app.error, Some(UserError::MissingInput(_))));
        assert_eq!(app.busy, None);
    }

    #[test]
    fn test_saving_twice_keeps_one_gallery_entry() {
        let mut app = app();
        let _ = app.update(Message::GenerateFinished(Ok(sample_poster())));
        let _ = app.update(Message::SaveToGallery);
        let _ = app.update(Message::SaveToGallery);
        assert_eq!(app.gallery.len(), 1);
        assert_eq!(app.gallery_handles.len(), 1);
    }

    #[test]
    fn test_clearing_product_images_clears_concept() {
        let mut app = app();
        app.product_images.push(SourceImage {
            file_name: "shoe.png".to_owned(),
            image: ImageObject::png(vec![1, 2, 3]),
        });
        app.concept = "a dramatic night scene".to_owned();

        let _ = app.update(Message::ClearProductImages);
        assert!(app.concept.is_empty());
        assert!(app.product_images.is_empty());
        assert!(app.poster.is_none());
    }

    #[test]
    fn test_remote_failure_leaves_poster_untouched() {
        let mut app = app();
        let _ = app.update(Message::GenerateFinished(Ok(sample_poster())));
        let before = app.poster.clone();

        let _ = app.update(Message::EditFinished(Err("boom".to_owned())));
        assert!(matches!(app.error, Some(UserError::RemoteCall(_))));
        assert_eq!(app.busy, None);
        assert_eq!(
            app.poster.as_ref().map(|p| &p.image),
            before.as_ref().map(|p| &p.image)
        );
    }
}
