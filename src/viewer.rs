use iced::{
    button, executor, Application, Button, Clipboard, Column, Command, Container, Element,
    Length, Row, Settings, Text,
};
use plotters::coord::Shift;
use plotters_iced::{Chart, ChartBuilder, ChartWidget, DrawingArea, DrawingBackend};

use crate::{
    aperture::ApertureKind,
    error::{Error, Result},
    plot::DiffractionFigure,
};

struct FigureChart(DiffractionFigure);

impl Chart<Message> for FigureChart {
    // Everything happens in draw_chart, the figure lays out its own panels.
    fn build_chart<DB: DrawingBackend>(&self, _builder: ChartBuilder<DB>) {}

    fn draw_chart<DB: DrawingBackend>(&self, root: DrawingArea<DB, Shift>) {
        if let Err(e) = self.0.draw(&root) {
            log::error!("failed to draw figure: {}", e);
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Message {
    Previous,
    Next,
}

struct Viewer {
    figures: Vec<(ApertureKind, FigureChart)>,
    current: usize,
    previous: button::State,
    next: button::State,
}

impl Application for Viewer {
    type Executor = executor::Default;
    type Message = Message;
    type Flags = Vec<(ApertureKind, DiffractionFigure)>;

    fn new(flags: Self::Flags) -> (Self, Command<Message>) {
        let figures = flags
            .into_iter()
            .map(|(kind, figure)| (kind, FigureChart(figure)))
            .collect();
        (
            Viewer {
                figures,
                current: 0,
                previous: button::State::new(),
                next: button::State::new(),
            },
            Command::none(),
        )
    }

    fn title(&self) -> String {
        match self.figures.get(self.current) {
            Some((kind, _)) => format!("Fraunhofer diffraction: {}", kind),
            None => "Fraunhofer diffraction".to_owned(),
        }
    }

    fn update(&mut self, message: Message, _clipboard: &mut Clipboard) -> Command<Message> {
        let len = self.figures.len().max(1);
        self.current = match message {
            Message::Previous => (self.current + len - 1) % len,
            Message::Next => (self.current + 1) % len,
        };
        Command::none()
    }

    fn view(&mut self) -> Element<Message> {
        let controls = Row::new()
            .spacing(10)
            .push(Button::new(&mut self.previous, Text::new("Previous")).on_press(Message::Previous))
            .push(Button::new(&mut self.next, Text::new("Next")).on_press(Message::Next));

        let mut content = Column::new().spacing(5).push(controls);
        if let Some((_, chart)) = self.figures.get_mut(self.current) {
            content = content.push(
                ChartWidget::new(chart)
                    .width(Length::Fill)
                    .height(Length::Fill),
            );
        }

        Container::new(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .padding(5)
            .into()
    }
}

/// Opens a window cycling through `figures` and blocks until it is closed.
pub fn show(figures: Vec<(ApertureKind, DiffractionFigure)>) -> Result<()> {
    if figures.is_empty() {
        return Ok(());
    }
    let (w, h) = crate::plot::FIGURE_SIZE;
    let mut settings = Settings::with_flags(figures);
    settings.antialiasing = true;
    settings.window.size = (w, h + 40);
    Viewer::run(settings).map_err(|e| Error::Viewer(e.to_string()))
}
